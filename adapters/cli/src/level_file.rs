use std::{fs, num::ParseIntError, path::Path};

use haggis_hunt_core::LevelSpec;
use thiserror::Error;

/// Errors raised while turning level text into a [`LevelSpec`].
#[derive(Debug, Error)]
pub(crate) enum LevelFileError {
    /// The level file could not be read from disk.
    #[error("could not read level file: {0}")]
    Io(#[from] std::io::Error),
    /// The file ended before the height and width were given.
    #[error("level file is missing its {0}")]
    MissingDimension(&'static str),
    /// A dimension was not a non-negative integer.
    #[error("level {field} '{value}' is not a valid dimension")]
    InvalidDimension {
        /// Which dimension failed to parse.
        field: &'static str,
        /// Raw token found in the file.
        value: String,
    },
    /// A cell code token was not an integer.
    #[error("cell code #{index} '{value}' is not an integer: {source}")]
    InvalidCode {
        /// Zero-based position of the code after the dimensions.
        index: usize,
        /// Raw token found in the file.
        value: String,
        /// Underlying integer parse failure.
        source: ParseIntError,
    },
}

/// Reads and parses the level stored at `path`.
pub(crate) fn read(path: &Path) -> Result<LevelSpec, LevelFileError> {
    let contents = fs::read_to_string(path)?;
    parse(&contents)
}

/// Parses whitespace separated integers: height, width, then the cell codes.
///
/// Only the token syntax is checked here. Dimension ranges, code counts and
/// start cells are validated when the world loads the level.
pub(crate) fn parse(contents: &str) -> Result<LevelSpec, LevelFileError> {
    let mut tokens = contents.split_whitespace();
    let height = dimension(tokens.next(), "height")?;
    let width = dimension(tokens.next(), "width")?;

    let codes = tokens
        .enumerate()
        .map(|(index, token)| {
            token
                .parse::<i32>()
                .map_err(|source| LevelFileError::InvalidCode {
                    index,
                    value: token.to_owned(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LevelSpec::new(height, width, codes))
}

fn dimension(token: Option<&str>, field: &'static str) -> Result<u32, LevelFileError> {
    let token = token.ok_or(LevelFileError::MissingDimension(field))?;
    token
        .parse::<u32>()
        .map_err(|_| LevelFileError::InvalidDimension {
            field,
            value: token.to_owned(),
        })
}
