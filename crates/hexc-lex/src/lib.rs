//! Character stream to token stream, with location tracking, multi-character
//! operator disambiguation, string-escape handling and comment elision.

mod cursor;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{Token, TokenKind};
