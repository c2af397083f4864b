/// Distance between a katakana code point and its hiragana counterpart.
const KATA_TO_HIRA: u32 = 0x60;

/// First katakana which has a hiragana counterpart (`ァ`).
const KATA_B: char = '\u{30a1}';

/// Last katakana which has a hiragana counterpart (`ヴ`).
const KATA_E: char = '\u{30f4}';

/// Test if the character is a katakana which can be folded into hiragana.
#[inline]
pub fn is_foldable_katakana(c: char) -> bool {
    (KATA_B..=KATA_E).contains(&c)
}

/// Fold a single katakana character into hiragana, leaving anything else
/// untouched.
#[inline]
pub fn fold_char(c: char) -> char {
    if !is_foldable_katakana(c) {
        return c;
    }

    char::from_u32(c as u32 - KATA_TO_HIRA).unwrap_or(c)
}

/// Convert all katakana in the given string to hiragana.
pub fn to_hiragana(input: &str) -> String {
    input.chars().map(fold_char).collect()
}

#[test]
fn test_to_hiragana() {
    assert_eq!(to_hiragana("マツリカ"), "まつりか");
    assert_eq!(to_hiragana("アイウエオ abc"), "あいうえお abc");
    assert_eq!(to_hiragana("ヴァ"), "ゔぁ");
    // Long vowel mark and middle dot have no hiragana counterpart.
    assert_eq!(to_hiragana("データ・ー"), "でーた・ー");
    assert_eq!(to_hiragana("漢字"), "漢字");
}
