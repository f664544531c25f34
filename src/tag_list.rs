//! Grouping of flat definition-list node streams.
//!
//! Some pages render a `<dl>` as a flat run of `<dt>` and `<dd>` siblings where a
//! term owns every detail up to the next term. [`group_tag_nodes`] rebuilds the
//! term → details pairs in one pass. A term without details is dropped, and
//! details seen before the first term are ignored.

/// A node of a flattened definition list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagNode<T> {
    Term(T),
    Detail(T),
}

/// Groups `nodes` into `(term, details)` pairs, preserving document order.
pub fn group_tag_nodes<T, I>(nodes: I) -> Vec<(T, Vec<T>)>
where
    I: IntoIterator<Item = TagNode<T>>,
{
    let mut groups = Vec::new();
    let mut current: Option<T> = None;
    let mut pending: Vec<T> = Vec::new();

    for node in nodes {
        match node {
            TagNode::Term(term) => {
                let previous = current.replace(term);
                let details = std::mem::take(&mut pending);
                if let Some(previous) = previous {
                    if !details.is_empty() {
                        groups.push((previous, details));
                    }
                }
            }
            TagNode::Detail(detail) => {
                if current.is_some() {
                    pending.push(detail);
                }
            }
        }
    }

    if let Some(term) = current {
        if !pending.is_empty() {
            groups.push((term, pending));
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::TagNode::{Detail, Term};
    use super::*;

    #[test]
    fn one_pair_per_term_in_order() {
        let nodes = vec![
            Term("購入場所"),
            Detail("ドラッグストア"),
            Term("効果"),
            Detail("保湿"),
            Detail("美白"),
            Term("関連ワード"),
            Detail("乾燥"),
        ];
        let groups = group_tag_nodes(nodes);
        assert_eq!(
            groups,
            vec![
                ("購入場所", vec!["ドラッグストア"]),
                ("効果", vec!["保湿", "美白"]),
                ("関連ワード", vec!["乾燥"]),
            ]
        );
    }

    #[test]
    fn term_without_details_is_dropped() {
        let arrangements = vec![
            vec![Term("a"), Term("b"), Detail("1")],
            vec![Term("b"), Detail("1"), Term("a")],
            vec![Term("a")],
            vec![Term("b"), Detail("1"), Term("a"), Term("c"), Detail("2")],
        ];
        for nodes in arrangements {
            let groups = group_tag_nodes(nodes.clone());
            assert!(
                groups.iter().all(|(term, _)| *term != "a"),
                "empty term leaked for {nodes:?}"
            );
        }
    }

    #[test]
    fn leading_details_are_ignored() {
        let groups = group_tag_nodes(vec![Detail("x"), Detail("y"), Term("色"), Detail("赤")]);
        assert_eq!(groups, vec![("色", vec!["赤"])]);
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let groups: Vec<(&str, Vec<&str>)> = group_tag_nodes(Vec::new());
        assert!(groups.is_empty());
    }
}
