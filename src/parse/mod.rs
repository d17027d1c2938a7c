mod builder;
mod lexer;

pub use builder::{parse_dice_part, parse_dice_parts, DicePartSpec};
pub use lexer::{tokenize, DiceLit, Modifier, Token, TokenKind};
