//! Small byte-slice helpers shared by the tokenizer and the JS scanner.

pub fn substr(s: &[u8], offset: usize, length: usize) -> &[u8] {
    &s[offset..offset + length]
}

/// Finds `pattern` in `s` at or after `offset`, byte-exact.
pub fn strpos(s: &[u8], pattern: &[u8], offset: usize) -> Option<usize> {
    if offset > s.len() {
        return None;
    }
    memchr::memmem::find(&s[offset..], pattern).map(|at| at + offset)
}

/// Finds `pattern` in `s` at or after `offset`, ASCII case-insensitive.
pub fn stripos(s: &[u8], pattern: &[u8], offset: usize) -> Option<usize> {
    let p_len = pattern.len();
    if p_len == 0 {
        return Some(offset);
    }
    if offset + p_len > s.len() {
        return None;
    }

    let p_end = pattern[p_len - 1];
    for at in offset..=(s.len() - p_len) {
        let c = s[at + p_len - 1];
        if !p_end.eq_ignore_ascii_case(&c) {
            continue;
        }
        if pattern.eq_ignore_ascii_case(&s[at..at + p_len]) {
            return Some(at);
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strpos_finds_match() {
        assert_eq!(strpos(b"hello world", b"world", 0), Some(6));
        assert_eq!(strpos(b"hello world", b"xyz", 0), None);
        assert_eq!(strpos(b"hello world", b"o", 5), Some(7));
    }

    #[test]
    fn stripos_ignores_case() {
        assert_eq!(stripos(b"Hello WORLD", b"world", 0), Some(6));
        assert_eq!(stripos(b"Hello WORLD", b"xyz", 0), None);
    }
}
