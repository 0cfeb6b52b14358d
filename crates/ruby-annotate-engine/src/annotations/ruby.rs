use serde::{Deserialize, Serialize};

use crate::editing::{Edge, StructuredEditor};
use crate::models::{Element, Node};

/// Text placed inside a ruby inserted at a collapsed cursor.
///
/// The reading (`Kana`) is the long-standing behavior; `Kanji` matches what a
/// wrapped range ends up holding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollapsedRubySeed {
    #[default]
    Kana,
    Kanji,
}

impl CollapsedRubySeed {
    pub fn pick<'a>(self, kanji: &'a str, kana: &'a str) -> &'a str {
        match self {
            CollapsedRubySeed::Kana => kana,
            CollapsedRubySeed::Kanji => kanji,
        }
    }
}

pub fn is_ruby(node: &Node) -> bool {
    node.is_ruby()
}

/// Whether the selection touches a ruby element
pub fn is_ruby_active<E: StructuredEditor>(editor: &E) -> bool {
    !editor.nodes(is_ruby).is_empty()
}

/// Replace every ruby the selection touches with its children
pub fn unwrap_ruby<E: StructuredEditor>(editor: &mut E) -> Result<(), E::Error> {
    editor.unwrap_nodes(is_ruby)
}

pub fn wrap_ruby<E: StructuredEditor>(
    editor: &mut E,
    kanji: &str,
    kana: &str,
) -> Result<(), E::Error> {
    wrap_ruby_with(editor, kanji, kana, CollapsedRubySeed::default())
}

/// Annotate the selection with a ruby. An existing ruby is unwrapped first, so
/// rubies never nest. A cursor gets a new ruby seeded per `seed`; a range is
/// wrapped exactly and the selection collapses to its end.
pub fn wrap_ruby_with<E: StructuredEditor>(
    editor: &mut E,
    kanji: &str,
    kana: &str,
    seed: CollapsedRubySeed,
) -> Result<(), E::Error> {
    if is_ruby_active(editor) {
        log::debug!("unwrapping active ruby before wrap");
        unwrap_ruby(editor)?;
    }

    let Some(collapsed) = editor.selection().map(|selection| selection.is_collapsed()) else {
        return Ok(());
    };

    if collapsed {
        let text = seed.pick(kanji, kana);
        editor.insert_node(Node::Element(Element::ruby(
            kanji,
            kana,
            vec![Node::text(text)],
        )))
    } else {
        editor.wrap_nodes(Element::ruby(kanji, kana, Vec::new()))?;
        editor.collapse(Edge::End)
    }
}

pub fn insert_ruby<E: StructuredEditor>(
    editor: &mut E,
    kanji: &str,
    kana: &str,
) -> Result<(), E::Error> {
    insert_ruby_with(editor, kanji, kana, CollapsedRubySeed::default())
}

/// [`wrap_ruby_with`], only when the editor has a selection
pub fn insert_ruby_with<E: StructuredEditor>(
    editor: &mut E,
    kanji: &str,
    kana: &str,
    seed: CollapsedRubySeed,
) -> Result<(), E::Error> {
    if editor.selection().is_none() {
        log::debug!("insert_ruby ignored: no selection");
        return Ok(());
    }
    wrap_ruby_with(editor, kanji, kana, seed)
}

pub fn add_ruby<E: StructuredEditor>(editor: &mut E, kana: &str) -> Result<bool, E::Error> {
    add_ruby_with(editor, kana, CollapsedRubySeed::default())
}

/// The add-ruby flow: the base text is whatever is selected. Returns `false`
/// without touching the document when `kana` is empty or nothing is selected.
pub fn add_ruby_with<E: StructuredEditor>(
    editor: &mut E,
    kana: &str,
    seed: CollapsedRubySeed,
) -> Result<bool, E::Error> {
    if kana.is_empty() {
        log::debug!("add_ruby aborted: empty reading");
        return Ok(false);
    }
    if editor.selection().is_none() {
        log::debug!("add_ruby ignored: no selection");
        return Ok(false);
    }

    let kanji = editor.selected_text();
    insert_ruby_with(editor, &kanji, kana, seed)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{Document, Point, Selection};
    use crate::models::{Format, Leaf, Marks};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ruby(kanji: &str, kana: &str, children: Vec<Node>) -> Node {
        Node::Element(Element::ruby(kanji, kana, children))
    }

    fn doc(children: Vec<Node>) -> Document {
        Document::from_nodes(vec![Node::paragraph(children)]).unwrap()
    }

    fn select(doc: &mut Document, anchor: (&[usize], usize), focus: (&[usize], usize)) {
        doc.select(Selection::new(
            Point::new(anchor.0.to_vec(), anchor.1),
            Point::new(focus.0.to_vec(), focus.1),
        ))
        .unwrap();
    }

    fn cursor(path: &[usize], offset: usize) -> Selection {
        Selection::collapsed(Point::new(path.to_vec(), offset))
    }

    #[test]
    fn test_wrap_range_splits_and_collapses_to_end() {
        let mut doc = doc(vec![Node::text("今日は晴れ")]);
        select(&mut doc, (&[0, 0], 0), (&[0, 0], 2));

        wrap_ruby(&mut doc, "今日", "きょう").unwrap();
        doc.normalize().unwrap();

        assert_eq!(
            doc.children(),
            &[Node::paragraph(vec![
                ruby("今日", "きょう", vec![Node::text("今日")]),
                Node::text("は晴れ"),
            ])]
        );
        assert_eq!(doc.selection(), Some(&cursor(&[0, 0, 0], 2)));
    }

    #[test]
    fn test_wrap_backward_range_collapses_to_document_end() {
        let mut doc = doc(vec![Node::text("あ漢字い")]);
        select(&mut doc, (&[0, 0], 3), (&[0, 0], 1));

        wrap_ruby(&mut doc, "漢字", "かんじ").unwrap();
        doc.normalize().unwrap();

        assert_eq!(
            doc.children(),
            &[Node::paragraph(vec![
                Node::text("あ"),
                ruby("漢字", "かんじ", vec![Node::text("漢字")]),
                Node::text("い"),
            ])]
        );
        assert_eq!(doc.selection(), Some(&cursor(&[0, 1, 0], 2)));
    }

    #[test]
    fn test_wrap_keeps_marks_inside_ruby() {
        let bold = Marks::new().with(Format::Bold);
        let mut doc = doc(vec![Node::Text(Leaf::with_marks("犬", bold.clone()))]);
        select(&mut doc, (&[0, 0], 0), (&[0, 0], 1));

        wrap_ruby(&mut doc, "犬", "いぬ").unwrap();

        assert_eq!(
            doc.children(),
            &[Node::paragraph(vec![ruby(
                "犬",
                "いぬ",
                vec![Node::Text(Leaf::with_marks("犬", bold))]
            )])]
        );
    }

    #[rstest]
    #[case::kana(CollapsedRubySeed::Kana, "ち")]
    #[case::kanji(CollapsedRubySeed::Kanji, "地")]
    fn test_collapsed_wrap_inserts_seeded_ruby(
        #[case] seed: CollapsedRubySeed,
        #[case] text: &str,
    ) {
        let mut doc = doc(vec![Node::text("ab")]);
        doc.select(cursor(&[0, 0], 1)).unwrap();

        wrap_ruby_with(&mut doc, "地", "ち", seed).unwrap();
        doc.normalize().unwrap();

        assert_eq!(
            doc.children(),
            &[Node::paragraph(vec![
                Node::text("a"),
                ruby("地", "ち", vec![Node::text(text)]),
                Node::text("b"),
            ])]
        );
        assert_eq!(doc.selection(), Some(&cursor(&[0, 1, 0], 1)));
        assert!(is_ruby_active(&doc));
    }

    #[test]
    fn test_rewrap_replaces_instead_of_nesting() {
        let mut doc = doc(vec![ruby("犬", "いぬ", vec![Node::text("犬")])]);
        select(&mut doc, (&[0, 0, 0], 0), (&[0, 0, 0], 1));

        wrap_ruby(&mut doc, "犬", "けん").unwrap();
        doc.normalize().unwrap();

        assert_eq!(
            doc.children(),
            &[Node::paragraph(vec![ruby(
                "犬",
                "けん",
                vec![Node::text("犬")]
            )])]
        );
    }

    #[test]
    fn test_unwrap_restores_text() {
        let mut doc = doc(vec![
            Node::text("a"),
            ruby("犬", "いぬ", vec![Node::text("犬")]),
            Node::text("b"),
        ]);
        doc.select(cursor(&[0, 1, 0], 1)).unwrap();
        assert!(is_ruby_active(&doc));

        unwrap_ruby(&mut doc).unwrap();
        doc.normalize().unwrap();

        assert_eq!(doc.children(), &[Node::paragraph(vec![Node::text("a犬b")])]);
        assert!(!is_ruby_active(&doc));
        assert_eq!(doc.selection(), Some(&cursor(&[0, 0], 2)));
    }

    #[test]
    fn test_unwrap_without_ruby_is_noop() {
        let mut doc = doc(vec![Node::text("abc")]);
        doc.select(cursor(&[0, 0], 1)).unwrap();
        let before = doc.clone();

        unwrap_ruby(&mut doc).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_cursor_next_to_ruby_is_not_inside() {
        let mut doc = doc(vec![
            Node::text("a"),
            ruby("犬", "いぬ", vec![Node::text("犬")]),
        ]);
        doc.select(cursor(&[0, 0], 1)).unwrap();
        assert!(!is_ruby_active(&doc));
    }

    #[test]
    fn test_insert_ruby_needs_selection() {
        let mut doc = doc(vec![Node::text("abc")]);
        let before = doc.clone();

        insert_ruby(&mut doc, "k", "r").unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_add_ruby_derives_kanji_from_selection() {
        let mut doc = doc(vec![Node::text("私は学生です")]);
        select(&mut doc, (&[0, 0], 2), (&[0, 0], 4));

        assert!(add_ruby(&mut doc, "がくせい").unwrap());
        doc.normalize().unwrap();

        assert_eq!(
            doc.children(),
            &[Node::paragraph(vec![
                Node::text("私は"),
                ruby("学生", "がくせい", vec![Node::text("学生")]),
                Node::text("です"),
            ])]
        );
    }

    #[test]
    fn test_add_ruby_with_empty_kana_aborts() {
        let mut doc = doc(vec![Node::text("学生")]);
        select(&mut doc, (&[0, 0], 0), (&[0, 0], 2));
        let before = doc.clone();

        assert!(!add_ruby(&mut doc, "").unwrap());
        assert_eq!(doc, before);
    }
}
