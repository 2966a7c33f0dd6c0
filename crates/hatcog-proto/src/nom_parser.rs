//! Nom-based IRC line parser.
//!
//! Splits a line into borrowed tags, prefix, command and parameters.
//! [`crate::line`] turns the result into an owned [`crate::Line`].

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    sequence::preceded,
    IResult,
};

use crate::error::ParseError;

/// A line split into borrowed pieces.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedLine<'a> {
    /// Tags without the leading `@`.
    pub tags: Option<&'a str>,
    /// Prefix without the leading `:`.
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub params: Vec<&'a str>,
}

fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parameters after the command. A `:` starts the trailing parameter,
/// which runs to the end of the line and may contain spaces. Runs of
/// spaces count as one separator.
fn parse_params(input: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut rest = input;

    while rest.starts_with(' ') {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            break;
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    params
}

impl<'a> ParsedLine<'a> {
    /// `[@tags] [:prefix] <command> [params...] [:trailing]`
    ///
    /// The input must already have its line terminator removed.
    pub fn parse(input: &'a str) -> Result<Self, ParseError> {
        if input.trim().is_empty() {
            return Err(ParseError::EmptyLine);
        }

        let starts_with_tags = input.starts_with('@');
        let (input, tags) = opt(parse_tags)(input).map_err(|_| ParseError::UnterminatedTags)?;
        if starts_with_tags && tags.is_none() {
            return Err(ParseError::UnterminatedTags);
        }
        let (input, _) = whitespace(input)?;

        let (input, prefix) = opt(parse_prefix)(input).map_err(|_| ParseError::MissingCommand)?;
        let (input, _) = whitespace(input)?;

        let (rest, command) = take_while1::<_, _, nom::error::Error<&str>>(|c: char| c != ' ')(
            input,
        )
        .map_err(|_| ParseError::MissingCommand)?;

        // RFC 2812: command = 1*letter / 3digit
        let is_all_letters = command.chars().all(|c| c.is_ascii_alphabetic());
        let is_three_digits = command.len() == 3 && command.chars().all(|c| c.is_ascii_digit());
        if !is_all_letters && !is_three_digits {
            return Err(ParseError::InvalidCommand(command.to_owned()));
        }

        Ok(ParsedLine {
            tags,
            prefix,
            command,
            params: parse_params(rest),
        })
    }
}

fn whitespace(input: &str) -> Result<(&str, &str), ParseError> {
    space0::<_, nom::error::Error<&str>>(input).map_err(|_| ParseError::MissingCommand)
}
