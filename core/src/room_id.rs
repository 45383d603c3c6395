use std::fmt;

use rand::Rng;

pub const TOKEN_LEN: usize = 8;
pub const TOKEN_ALPHABET: &str = "0123456789abcdef";

pub fn short_token() -> String {
    let mut rng = rand::rng();
    let alphabet = TOKEN_ALPHABET.as_bytes();
    let mut token = String::with_capacity(TOKEN_LEN);
    for _ in 0..TOKEN_LEN {
        let idx = rng.random_range(0..alphabet.len());
        token.push(alphabet[idx] as char);
    }
    token
}

pub fn is_valid_room_id(value: &str) -> bool {
    if value.len() != TOKEN_LEN {
        return false;
    }
    value.chars().all(|ch| TOKEN_ALPHABET.contains(ch))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    pub fn generate() -> Self {
        Self(short_token())
    }

    pub fn parse(value: &str) -> Result<Self, RoomIdError> {
        if value.len() != TOKEN_LEN {
            return Err(RoomIdError::InvalidLength {
                expected: TOKEN_LEN,
                found: value.len(),
            });
        }
        for (idx, ch) in value.chars().enumerate() {
            if !TOKEN_ALPHABET.contains(ch) {
                return Err(RoomIdError::InvalidCharacter { ch, index: idx });
            }
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RoomId {
    type Err = RoomIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomIdError {
    InvalidLength { expected: usize, found: usize },
    InvalidCharacter { ch: char, index: usize },
}

impl fmt::Display for RoomIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomIdError::InvalidLength { expected, found } => {
                write!(f, "room id must be {expected} chars, got {found}")
            }
            RoomIdError::InvalidCharacter { ch, index } => {
                write!(f, "invalid character '{ch}' at position {index}")
            }
        }
    }
}

impl std::error::Error for RoomIdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_validate() {
        for _ in 0..32 {
            let token = short_token();
            assert!(is_valid_room_id(&token));
            assert!(RoomId::parse(&token).is_ok());
        }
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            RoomId::parse("abc"),
            Err(RoomIdError::InvalidLength { found: 3, .. })
        ));
        assert!(matches!(
            RoomId::parse("abcdefgZ"),
            Err(RoomIdError::InvalidCharacter { ch: 'Z', index: 7 })
        ));
    }
}
