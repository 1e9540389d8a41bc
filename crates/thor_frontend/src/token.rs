use crate::{Node, NodeCopy};

#[derive(Node!)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based source position of the token's first character.
    pub line: u32,
    pub column: u32,
}

#[derive(Node!)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),

    Identifier(String),
    Keyword(Keyword),

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,

    Dot,
    Colon,
    Comma,
    Semicolon,
    Arrow,
    /// `::`, joining namespace-qualified identifiers.
    PathSep,

    Add,
    Sub,
    Mul,
    Div,
    Mod,

    Assign,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    And,
    Or,
    Not,

    Eof,
}

#[derive(NodeCopy!)]
pub enum Keyword {
    Int,
    Float,
    String,
    Bool,
    Void,

    If,
    Else,
    While,
    // Reserved but not yet part of the grammar.
    For,
    Return,

    Import,
    Extern,
    Func,
    Package,
    Const,
    Ref,
}

impl TokenKind {
    pub fn token_name(&self) -> &'static str {
        match self {
            TokenKind::Int(_) => "integer",
            TokenKind::Float(_) => "float",
            TokenKind::Str(_) => "string",
            TokenKind::Bool(_) => "boolean",
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Keyword(kw) => match kw {
                Keyword::Int => "keyword `int`",
                Keyword::Float => "keyword `float`",
                Keyword::String => "keyword `string`",
                Keyword::Bool => "keyword `bool`",
                Keyword::Void => "keyword `void`",
                Keyword::If => "keyword `if`",
                Keyword::Else => "keyword `else`",
                Keyword::While => "keyword `while`",
                Keyword::For => "keyword `for`",
                Keyword::Return => "keyword `return`",
                Keyword::Import => "keyword `import`",
                Keyword::Extern => "keyword `extern`",
                Keyword::Func => "keyword `func`",
                Keyword::Package => "keyword `package`",
                Keyword::Const => "keyword `const`",
                Keyword::Ref => "keyword `ref`",
            },
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Dot => "`.`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Arrow => "`->`",
            TokenKind::PathSep => "`::`",
            TokenKind::Add => "`+`",
            TokenKind::Sub => "`-`",
            TokenKind::Mul => "`*`",
            TokenKind::Div => "`/`",
            TokenKind::Mod => "`%`",
            TokenKind::Assign => "`=`",
            TokenKind::Eq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::LtEq => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::GtEq => "`>=`",
            TokenKind::And => "`&&`",
            TokenKind::Or => "`||`",
            TokenKind::Not => "`!`",
            TokenKind::Eof => "end of input",
        }
    }

    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "int" => TokenKind::Keyword(Keyword::Int),
            "float" => TokenKind::Keyword(Keyword::Float),
            "string" => TokenKind::Keyword(Keyword::String),
            "bool" => TokenKind::Keyword(Keyword::Bool),
            "void" => TokenKind::Keyword(Keyword::Void),
            "if" => TokenKind::Keyword(Keyword::If),
            "else" => TokenKind::Keyword(Keyword::Else),
            "while" => TokenKind::Keyword(Keyword::While),
            "for" => TokenKind::Keyword(Keyword::For),
            "return" => TokenKind::Keyword(Keyword::Return),
            "import" => TokenKind::Keyword(Keyword::Import),
            "extern" => TokenKind::Keyword(Keyword::Extern),
            "func" => TokenKind::Keyword(Keyword::Func),
            "package" => TokenKind::Keyword(Keyword::Package),
            "const" => TokenKind::Keyword(Keyword::Const),
            "ref" => TokenKind::Keyword(Keyword::Ref),
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => return None,
        };

        Some(kind)
    }
}
