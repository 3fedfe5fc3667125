//! 以字符（Unicode scalar）为单位的文本工具。
//!
//! 引擎对外的所有偏移都按字符计，不按字节计。

/// 字符数。
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 字符下标 -> 字节下标；越界时返回 `s.len()`。
pub fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

/// 取字符区间 `[start, end)`；区间会被截到文本范围内。
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let end = end.max(start);
    &s[byte_index(s, start)..byte_index(s, end)]
}

/// 替换字符区间 `[start, end)`，区间外的内容原样保留。
pub fn splice_chars(s: &str, start: usize, end: usize, replacement: &str) -> String {
    let len = char_len(s);
    let start = start.min(len);
    let end = end.clamp(start, len);
    let (a, b) = (byte_index(s, start), byte_index(s, end));
    let mut out = String::with_capacity(s.len() - (b - a) + replacement.len());
    out.push_str(&s[..a]);
    out.push_str(replacement);
    out.push_str(&s[b..]);
    out
}

/// 在 `[0, end)` 内找最后一个触发符（字符下标）。
///
/// 标记标签 `<...>` 内部的字符不参与匹配（例如 `<a href="mailto:x@y">`），
/// 这样扫描等价于“去掉标记后的纯文本”，但返回的仍是原文中的下标。
/// 只有在 `end` 之前能找到闭合 `>` 的 `<` 才算标签开头（`a<b` 是普通文本）。
pub fn rfind_trigger(s: &str, end: usize, trigger: char) -> Option<usize> {
    let chars: Vec<char> = s.chars().take(end).collect();
    let last_close = chars.iter().rposition(|&c| c == '>');
    let mut found = None;
    let mut in_tag = false;
    for (i, &ch) in chars.iter().enumerate() {
        if in_tag {
            if ch == '>' {
                in_tag = false;
            }
            continue;
        }
        if ch == '<' && last_close.is_some_and(|close| close > i) {
            if let Some(&next) = chars.get(i + 1) {
                if next.is_ascii_alphabetic() || next == '/' || next == '!' {
                    in_tag = true;
                    continue;
                }
            }
        }
        if ch == trigger {
            found = Some(i);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("hello @", 7, Some(6))]
    #[case("hello @jo", 9, Some(6))]
    #[case("hello @jo", 6, None)]
    #[case("a@b@c", 5, Some(3))]
    #[case("a@b@c", 3, Some(1))]
    #[case("no trigger", 10, None)]
    #[case("", 0, None)]
    #[case("if a<b ask @jo", 14, Some(11))]
    #[case("x <b>@jo", 8, Some(5))]
    #[case("<a href=\"mailto:x@y\">x</a> ", 27, None)]
    #[case("<b>john</b> @", 13, Some(12))]
    #[case("1 < 2 @", 7, Some(6))]
    fn finds_last_trigger(#[case] s: &str, #[case] end: usize, #[case] want: Option<usize>) {
        assert_eq!(rfind_trigger(s, end, '@'), want);
    }

    #[test]
    fn splice_keeps_outside_verbatim() {
        assert_eq!(splice_chars("hello @jo", 6, 9, "<b>john</b>"), "hello <b>john</b>");
        assert_eq!(splice_chars("你好@张", 2, 4, "[张三]"), "你好[张三]");
        assert_eq!(splice_chars("abc", 5, 9, "x"), "abcx");
    }

    #[test]
    fn slices_by_chars() {
        assert_eq!(char_slice("你好@张三", 3, 5), "张三");
        assert_eq!(char_slice("abc", 2, 1), "");
    }
}
