use super::*;
use proptest::prelude::*;

/// エスケープ結果を元の文字列へ戻す（テスト専用の逆変換）
fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

proptest! {
    /// エスケープ結果に生の特殊文字（& 単体を含む）が残らない
    #[test]
    fn prop_escape_leaves_no_raw_special_chars(input in ".*") {
        let escaped = escape(&input);

        prop_assert!(!escaped.contains('<'));
        prop_assert!(!escaped.contains('>'));
        prop_assert!(!escaped.contains('"'));
        prop_assert!(!escaped.contains('\''));

        // & はエンティティ参照の開始としてのみ現れる
        let stripped = escaped
            .replace("&amp;", "")
            .replace("&lt;", "")
            .replace("&gt;", "")
            .replace("&quot;", "")
            .replace("&apos;", "");
        prop_assert!(!stripped.contains('&'));
    }

    /// エスケープは可逆（値を失わない）
    #[test]
    fn prop_escape_roundtrips(input in ".*") {
        prop_assert_eq!(unescape(&escape(&input)), input);
    }

    /// 特殊文字を含まない入力はそのまま通る
    #[test]
    fn prop_escape_identity_on_plain_input(input in "[a-zA-Z0-9._ -]{0,40}") {
        prop_assert_eq!(escape(&input), input);
    }

    /// クエリ全体が両方の値をエスケープ済みで含む
    #[test]
    fn prop_query_embeds_escaped_values(
        assembly in "[a-zA-Z0-9.'<>&]{1,20}",
        solution in "[a-zA-Z0-9.'<>&]{1,20}"
    ) {
        let xml = solution_component_query(&assembly, &solution);

        prop_assert!(xml.contains(&escape(&assembly)));
        prop_assert!(xml.contains(&escape(&solution)));
    }
}
