#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use throwcheck::config::CheckConfig;

/// Source fragments close enough to the accepted language to get past the lexer.
#[derive(Arbitrary, Debug)]
enum Fragment {
    Marker,
    OtherAttribute,
    Int,
    Void,
    Struct,
    Noexcept,
    Extern,
    Throw,
    Ident(u8),
    IntLit(u8),
    If,
    Else,
    For,
    While,
    Do,
    Switch,
    Case,
    Default,
    Return,
    Break,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Colon,
    Comma,
    Eq,
    Plus,
    Less,
}

impl Fragment {
    fn text(&self) -> String {
        match self {
            Fragment::Marker => "[[maybe_unhandled]]".to_string(),
            Fragment::OtherAttribute => "[[nodiscard]]".to_string(),
            Fragment::Int => "int".to_string(),
            Fragment::Void => "void".to_string(),
            Fragment::Struct => "struct".to_string(),
            Fragment::Noexcept => "noexcept".to_string(),
            Fragment::Extern => "extern \"C\"".to_string(),
            Fragment::Throw => "throw".to_string(),
            // A handful of names so calls can meet their declarations
            Fragment::Ident(n) => format!("f{}", n % 4),
            Fragment::IntLit(n) => n.to_string(),
            Fragment::If => "if".to_string(),
            Fragment::Else => "else".to_string(),
            Fragment::For => "for".to_string(),
            Fragment::While => "while".to_string(),
            Fragment::Do => "do".to_string(),
            Fragment::Switch => "switch".to_string(),
            Fragment::Case => "case".to_string(),
            Fragment::Default => "default".to_string(),
            Fragment::Return => "return".to_string(),
            Fragment::Break => "break".to_string(),
            Fragment::LParen => "(".to_string(),
            Fragment::RParen => ")".to_string(),
            Fragment::LBrace => "{".to_string(),
            Fragment::RBrace => "}".to_string(),
            Fragment::Semi => ";".to_string(),
            Fragment::Colon => ":".to_string(),
            Fragment::Comma => ",".to_string(),
            Fragment::Eq => "=".to_string(),
            Fragment::Plus => "+".to_string(),
            Fragment::Less => "<".to_string(),
        }
    }
}

#[derive(Arbitrary, Debug)]
struct FuzzSource {
    fragments: Vec<Fragment>,
    header_only: bool,
}

fuzz_target!(|input: FuzzSource| {
    let source = input.fragments.iter().map(Fragment::text).collect::<Vec<_>>().join(" ");
    let mut config = CheckConfig::default();
    if input.header_only {
        config.coverage = throwcheck::config::Coverage::HeaderOnly;
    }

    // Front-end may reject the input, but must never panic; the checker has no failure mode.
    let Ok(tree) = throwcheck::parse_source(&source, &config) else { return };
    for diag in throwcheck::check::check_tree(&tree, &config) {
        assert!(diag.span.start <= diag.span.end && diag.span.end <= source.len());
    }
});
