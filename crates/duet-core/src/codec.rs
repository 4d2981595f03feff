//! Snapshot codec - document bytes <-> `bytea` text column
//!
//! バックエンドのクライアントは `bytea` カラムをテキスト（`\x` + hex）として扱うため、
//! スナップショットはこの形式で読み書きします。
//!
//! # 設計原則
//! - `encode` は常に小文字 hex + `\x` プレフィックス
//! - `decode` は大文字・小文字どちらも受け付ける
//! - 壊れた入力は「ドキュメントなし」（空バイト列）として扱い、呼び出し側にエラーを返さない

use thiserror::Error;
use tracing::warn;

/// PostgreSQL の bytea hex 形式のプレフィックス
pub const BYTEA_PREFIX: &str = "\\x";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("odd number of hex digits")]
    OddLength,

    #[error("invalid hex character {c:?} at position {index}")]
    InvalidCharacter { c: char, index: usize },
}

impl From<hex::FromHexError> for CodecError {
    fn from(err: hex::FromHexError) -> Self {
        match err {
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                CodecError::InvalidCharacter { c, index }
            }
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                CodecError::OddLength
            }
        }
    }
}

/// bytes を `\x` + 小文字 hex に変換
pub fn encode(bytes: &[u8]) -> String {
    format!("{BYTEA_PREFIX}{}", hex::encode(bytes))
}

/// 厳密なデコード（失敗理由を返す）
///
/// `\x` プレフィックスは省略可。`""` と `"\x"` は空バイト列。
pub fn try_decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let digits = text.strip_prefix(BYTEA_PREFIX).unwrap_or(text);
    Ok(hex::decode(digits)?)
}

/// 寛容なデコード
///
/// 壊れた入力は warn ログを出して空バイト列にフォールバックします。
pub fn decode(text: &str) -> Vec<u8> {
    match try_decode(text) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, len = text.len(), "stored snapshot is not valid hex; treating as empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn encode_uses_bytea_prefix_and_lowercase() {
        assert_eq!(encode(&[0x00, 0xab, 0xff]), "\\x00abff");
        assert_eq!(encode(&[]), "\\x");
    }

    #[test]
    fn decode_inverts_encode() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(decode(&encode(&bytes)), bytes);
    }

    #[rstest]
    #[case::empty("")]
    #[case::prefix_only("\\x")]
    fn empty_inputs_decode_to_nothing(#[case] text: &str) {
        assert_eq!(try_decode(text), Ok(Vec::new()));
    }

    #[rstest]
    #[case::upper("\\xABCDEF", vec![0xab, 0xcd, 0xef])]
    #[case::mixed("\\xaBcD", vec![0xab, 0xcd])]
    #[case::no_prefix("0a0b", vec![0x0a, 0x0b])]
    fn decode_is_case_insensitive(#[case] text: &str, #[case] expected: Vec<u8>) {
        assert_eq!(decode(text), expected);
    }

    #[rstest]
    #[case::odd_length("\\xabc", CodecError::OddLength)]
    #[case::non_hex("\\xzz", CodecError::InvalidCharacter { c: 'z', index: 0 })]
    fn malformed_input_is_reported(#[case] text: &str, #[case] expected: CodecError) {
        assert_eq!(try_decode(text), Err(expected));
        assert!(decode(text).is_empty());
    }
}
