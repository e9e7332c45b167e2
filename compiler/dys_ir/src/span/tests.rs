use super::*;
use pretty_assertions::assert_eq;

#[test]
fn merge_covers_both_spans() {
    let merged = Span::new(4, 8).merge(Span::new(1, 5));
    assert_eq!(merged, Span::new(1, 8));
}

#[test]
fn offset_by_shifts_both_ends() {
    assert_eq!(Span::new(2, 5).offset_by(10), Span::new(12, 15));
}

#[test]
fn position_on_first_line() {
    let index = LineIndex::new("x = 1\ny = 2\n");
    assert_eq!(index.position(0), (1, 0));
    assert_eq!(index.position(4), (1, 4));
}

#[test]
fn position_after_newline_starts_next_line() {
    let index = LineIndex::new("x = 1\ny = 2\n");
    assert_eq!(index.position(6), (2, 0));
    assert_eq!(index.position(10), (2, 4));
}

#[test]
fn locate_multiline_span() {
    let index = LineIndex::new("def f():\n    return 1\n");
    let range = index.locate(Span::new(0, 21));
    assert_eq!(
        range,
        SourceRange {
            lineno: 1,
            col_offset: 0,
            end_lineno: 2,
            end_col_offset: 12,
        }
    );
}

#[test]
fn source_ranges_order_by_start() {
    let early = SourceRange {
        lineno: 1,
        col_offset: 4,
        end_lineno: 3,
        end_col_offset: 0,
    };
    let late = SourceRange {
        lineno: 2,
        col_offset: 0,
        end_lineno: 2,
        end_col_offset: 1,
    };
    assert!(early < late);
}

proptest::proptest! {
    #[test]
    fn every_offset_maps_inside_its_line(src in "[a-z \n]{0,64}", pick in 0usize..64) {
        let index = LineIndex::new(&src);
        let offset = u32::try_from(pick.min(src.len())).unwrap_or(0);
        let (line, column) = index.position(offset);
        proptest::prop_assert!(line >= 1);
        proptest::prop_assert!(line as usize <= index.line_count());
        proptest::prop_assert!(column <= offset);
    }
}
