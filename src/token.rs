/// Byte range of a token inside the line it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Structural words of the statement surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Is,
    A,
    Has,
    Field,
    Method,
    Default,
    Do,
    With,
    New,
    Of,
    Myself,
    To,
    Set,
    Go,
    Page,
    Connect,
    Print,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        let keyword = match word {
            "is" => Self::Is,
            "a" => Self::A,
            "has" => Self::Has,
            "field" => Self::Field,
            "method" => Self::Method,
            "default" => Self::Default,
            "do" => Self::Do,
            "with" => Self::With,
            "new" => Self::New,
            "of" => Self::Of,
            "myself" => Self::Myself,
            "to" => Self::To,
            "set" => Self::Set,
            "go" => Self::Go,
            "page" => Self::Page,
            "connect" => Self::Connect,
            "print" => Self::Print,
            _ => return None,
        };
        Some(keyword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    /// Quoted run; the token text keeps its quotes.
    String,
    Number,
    Boolean,
    Identifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, span: Span) -> Self {
        Self { kind, text, span }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }
}
