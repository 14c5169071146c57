mod comments;
mod migrations;
