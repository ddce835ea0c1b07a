use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

/// Build the lexer for command lines.
///
/// Produces every maximal run of non-whitespace characters with its span.
/// Any input lexes; an all-whitespace line yields no words.
pub fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<(String, SimpleSpan)>, extra::Err<Rich<'a, char>>>
{
    let word = any()
        .filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice()
        .map(|s: &str| s.to_string())
        .labelled("word");

    text::whitespace().ignore_then(
        word.map_with(|w, e| (w, e.span()))
            .then_ignore(text::whitespace())
            .repeated()
            .collect(),
    )
}

/// Split a command line into words.
pub fn words(input: &str) -> Vec<String> {
    lexer()
        .parse(input)
        .into_output()
        .unwrap_or_default()
        .into_iter()
        .map(|(word, _)| word)
        .collect()
}
