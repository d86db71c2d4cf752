//! Comprehensive vim state machine test suite.
//!
//! Test categories:
//! 1. State machine (mode transitions, escape reset)
//! 2. Count handling (accumulation, raw counts for gg/G)
//! 3. Motions (h/j/k/l/w/b/e/0/$/gg/G, zones, content words)
//! 4. Operators (d/y/c with motions, linewise doubles, range rules)
//! 5. Visual modes (v, Ctrl+v, mode switching)
//! 6. Dot repeat
//! 7. Register selection and jumplist actions

use super::*;
use crate::input::registers::RegisterName;

// ============================================================================
// Test Helpers
// ============================================================================

/// Plain 8x16 grid with a single main zone and beat words every 4 columns
fn zoned_vim() -> VimState {
    VimState::with_grid_semantics(
        8,
        16,
        GridSemantics::with_zones(vec![Zone::new(0, 15).main().with_word_interval(4)]),
    )
}

/// Channel-rack shaped grid: mute (0), name (1), steps (2-17, main)
fn rack_vim() -> VimState {
    VimState::with_grid_semantics(
        8,
        18,
        GridSemantics::with_zones(vec![
            Zone::new(0, 0),
            Zone::new(1, 1),
            Zone::new(2, 17).main().with_word_interval(4),
        ]),
    )
}

/// Content-word grid: one main zone, no interval, words come from content
fn content_vim() -> VimState {
    VimState::with_grid_semantics(
        8,
        16,
        GridSemantics::with_zones(vec![Zone::new(0, 15).main()]),
    )
}

fn press(vim: &mut VimState, key: char, cursor: Position) -> Vec<VimAction> {
    vim.process_key(key, false, cursor, None)
}

fn press_ctrl(vim: &mut VimState, key: char, cursor: Position) -> Vec<VimAction> {
    vim.process_key(key, true, cursor, None)
}

fn get_cursor_move(actions: &[VimAction]) -> Option<Position> {
    actions.iter().find_map(|a| match a {
        VimAction::MoveCursor(pos) => Some(*pos),
        _ => None,
    })
}

fn get_yank_range(actions: &[VimAction]) -> Option<Range> {
    actions.iter().find_map(|a| match a {
        VimAction::Yank(range) => Some(*range),
        _ => None,
    })
}

fn get_delete_range(actions: &[VimAction]) -> Option<Range> {
    actions.iter().find_map(|a| match a {
        VimAction::Delete(range) => Some(*range),
        _ => None,
    })
}

fn has_action(actions: &[VimAction], check: impl Fn(&VimAction) -> bool) -> bool {
    actions.iter().any(check)
}

// ============================================================================
// 1. INITIAL STATE AND MODE TRANSITIONS
// ============================================================================

#[test]
fn test_initial_state() {
    let vim = zoned_vim();
    assert_eq!(vim.mode(), VimMode::Normal);
    assert_eq!(vim.count(), None);
    assert_eq!(vim.operator(), None);
    assert_eq!(vim.visual_anchor(), None);
}

#[test]
fn test_operators_enter_operator_pending() {
    for (key, op) in [
        ('d', Operator::Delete),
        ('y', Operator::Yank),
        ('c', Operator::Change),
    ] {
        let mut vim = zoned_vim();
        press(&mut vim, key, Position::new(0, 0));
        assert_eq!(vim.mode(), VimMode::OperatorPending);
        assert_eq!(vim.operator(), Some(op));
    }
}

#[test]
fn test_v_enters_visual_with_anchor() {
    let mut vim = zoned_vim();
    let cursor = Position::new(2, 5);
    let actions = press(&mut vim, 'v', cursor);

    assert_eq!(vim.mode(), VimMode::Visual);
    assert_eq!(vim.visual_anchor(), Some(cursor));
    assert!(has_action(&actions, |a| matches!(
        a,
        VimAction::ModeChanged(VimMode::Visual)
    )));
}

#[test]
fn test_ctrl_v_enters_visual_block() {
    let mut vim = zoned_vim();
    let cursor = Position::new(2, 5);
    press_ctrl(&mut vim, 'v', cursor);

    assert_eq!(vim.mode(), VimMode::VisualBlock);
    assert_eq!(vim.visual_anchor(), Some(cursor));
}

#[test]
fn test_motion_stays_in_normal() {
    let mut vim = zoned_vim();
    press(&mut vim, 'j', Position::new(2, 5));
    assert_eq!(vim.mode(), VimMode::Normal);
}

// ============================================================================
// Escape reset: any key sequence followed by Escape lands in clean normal
// ============================================================================

#[test]
fn test_escape_resets_after_any_sequence() {
    let sequences: &[&[char]] = &[
        &['3', 'd'],
        &['v', 'j', 'j'],
        &['d', '2'],
        &['1', '2', '3'],
        &['g'],
        &['"'],
        &['c', 'g'],
    ];

    for seq in sequences {
        let mut vim = zoned_vim();
        let mut cursor = Position::new(3, 4);
        for &key in *seq {
            let actions = press(&mut vim, key, cursor);
            if let Some(pos) = get_cursor_move(&actions) {
                cursor = pos;
            }
        }
        press(&mut vim, '\x1b', cursor);

        assert_eq!(vim.mode(), VimMode::Normal, "sequence {seq:?}");
        assert_eq!(vim.count(), None, "sequence {seq:?}");
        assert_eq!(vim.operator(), None, "sequence {seq:?}");
        assert_eq!(vim.visual_anchor(), None, "sequence {seq:?}");
    }
}

#[test]
fn test_escape_from_visual_emits_cleanup() {
    let mut vim = zoned_vim();
    press(&mut vim, 'v', Position::new(0, 0));
    let actions = press(&mut vim, '\x1b', Position::new(0, 3));

    assert!(has_action(&actions, |a| matches!(
        a,
        VimAction::SelectionChanged(None)
    )));
    assert!(has_action(&actions, |a| matches!(
        a,
        VimAction::Escape(VimMode::Visual)
    )));
}

// ============================================================================
// 2. COUNTS
// ============================================================================

#[test]
fn test_count_accumulates_digits() {
    let mut vim = VimState::with_grid_semantics(
        200,
        16,
        GridSemantics::with_zones(vec![Zone::new(0, 15).main().with_word_interval(4)]),
    );
    press(&mut vim, '1', Position::new(0, 0));
    press(&mut vim, '2', Position::new(0, 0));
    press(&mut vim, '3', Position::new(0, 0));
    assert_eq!(vim.count(), Some(123));

    let actions = press(&mut vim, 'j', Position::new(0, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(123, 0)));
    assert_eq!(vim.count(), None);
}

#[test]
fn test_count_clamped_by_grid_bounds() {
    let mut vim = zoned_vim();
    press(&mut vim, '9', Position::new(0, 0));
    press(&mut vim, '9', Position::new(0, 0));
    let actions = press(&mut vim, 'j', Position::new(0, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(7, 0)));
}

#[test]
fn test_leading_zero_is_motion_not_digit() {
    let mut vim = rack_vim();
    // '0' with no count moves to the main zone start
    let actions = press(&mut vim, '0', Position::new(0, 10));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 2)));
}

#[test]
fn test_zero_extends_count() {
    let mut vim = VimState::with_grid_semantics(
        100,
        16,
        GridSemantics::with_zones(vec![Zone::new(0, 15).main().with_word_interval(4)]),
    );
    press(&mut vim, '1', Position::new(0, 0));
    press(&mut vim, '0', Position::new(0, 0));
    assert_eq!(vim.count(), Some(10));
}

// ============================================================================
// 3. MOTIONS
// ============================================================================

#[test]
fn test_h_l_within_zone() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'l', Position::new(0, 5));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 6)));

    let actions = press(&mut vim, 'h', Position::new(0, 5));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 4)));
}

#[test]
fn test_l_stops_at_outermost_edge() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'l', Position::new(0, 15));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 15)));
}

#[test]
fn test_h_l_cross_zone_boundaries() {
    let mut vim = rack_vim();
    // l from the name zone enters the steps zone at its start
    let actions = press(&mut vim, 'l', Position::new(0, 1));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 2)));

    // h from the steps zone start enters the name zone at its end
    let actions = press(&mut vim, 'h', Position::new(0, 2));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 1)));

    // h at the leftmost zone stays
    let actions = press(&mut vim, 'h', Position::new(0, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 0)));
}

#[test]
fn test_j_k_clamp_to_rows() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'k', Position::new(0, 3));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 3)));

    let actions = press(&mut vim, 'j', Position::new(7, 3));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(7, 3)));
}

#[test]
fn test_w_interval_words() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'w', Position::new(0, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 4)));

    let mut vim = zoned_vim();
    press(&mut vim, '2', Position::new(0, 0));
    let actions = press(&mut vim, 'w', Position::new(0, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 8)));
}

#[test]
fn test_w_wraps_to_next_row_past_last_word() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'w', Position::new(0, 14));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(1, 0)));
}

#[test]
fn test_w_on_last_row_falls_to_zone_edge() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'w', Position::new(7, 14));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(7, 15)));
}

#[test]
fn test_b_interval_words() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'b', Position::new(0, 5));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 4)));

    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'b', Position::new(0, 4));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 0)));

    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'b', Position::new(0, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 0)));
}

#[test]
fn test_e_interval_word_ends() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'e', Position::new(0, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 3)));

    // Already at a word end: next word's end
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'e', Position::new(0, 3));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 7)));
}

#[test]
fn test_w_content_words() {
    let mut vim = content_vim();
    let mut content = vec![false; 16];
    content[2] = true;
    content[3] = true;
    content[5] = true;

    // Word starts where content turns on
    let actions = vim.process_key('w', false, Position::new(0, 0), Some(&content));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 2)));

    let actions = vim.process_key('w', false, Position::new(0, 2), Some(&content));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 5)));
}

#[test]
fn test_b_content_words() {
    let mut vim = content_vim();
    let mut content = vec![false; 16];
    content[2] = true;
    content[3] = true;
    content[5] = true;

    // From a run start, back to the previous word start
    let actions = vim.process_key('b', false, Position::new(0, 5), Some(&content));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 2)));

    // From inside a run, back to its start
    let actions = vim.process_key('b', false, Position::new(0, 3), Some(&content));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 2)));
}

#[test]
fn test_e_content_word_ends() {
    let mut vim = content_vim();
    let mut content = vec![false; 16];
    content[2] = true;
    content[3] = true;
    content[5] = true;

    // On content with more ahead: the run's end
    let actions = vim.process_key('e', false, Position::new(0, 2), Some(&content));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 3)));

    // At a run end: skip to the next run's end
    let actions = vim.process_key('e', false, Position::new(0, 3), Some(&content));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 5)));
}

#[test]
fn test_zero_and_dollar_anchor_on_main_zone() {
    let mut vim = rack_vim();
    // From the mute zone, '0' goes to the main (steps) zone start
    let actions = press(&mut vim, '0', Position::new(0, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 2)));

    let actions = press(&mut vim, '$', Position::new(0, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 17)));
}

// ============================================================================
// gg / G with raw counts
// ============================================================================

#[test]
fn test_gg_requires_two_g() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'g', Position::new(5, 3));
    assert!(get_cursor_move(&actions).is_none());

    let actions = press(&mut vim, 'g', Position::new(5, 3));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 3)));
    assert!(has_action(&actions, |a| matches!(a, VimAction::PushJump)));
}

#[test]
fn test_lone_g_then_other_key_is_a_noop() {
    let mut vim = zoned_vim();
    press(&mut vim, 'g', Position::new(5, 3));

    // The aborted g-sequence swallows the second key entirely
    let actions = press(&mut vim, 'j', Position::new(5, 3));
    assert!(actions.is_empty());
    assert_eq!(vim.mode(), VimMode::Normal);
    assert_eq!(vim.count(), None);

    // The machine is clean again: a following j moves as usual
    let actions = press(&mut vim, 'j', Position::new(5, 3));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(6, 3)));
}

#[test]
fn test_lone_g_abort_keeps_visual_selection() {
    let mut vim = zoned_vim();
    let anchor = Position::new(2, 3);
    press(&mut vim, 'v', anchor);
    press(&mut vim, 'g', anchor);

    let actions = press(&mut vim, 'l', anchor);
    assert!(actions.is_empty());
    assert_eq!(vim.mode(), VimMode::Visual);
    assert_eq!(vim.visual_anchor(), Some(anchor));
}

#[test]
fn test_g_jump_to_bottom() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'G', Position::new(2, 3));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(7, 3)));
    assert!(has_action(&actions, |a| matches!(a, VimAction::PushJump)));
}

#[test]
fn test_raw_count_gg_means_row_k_minus_1() {
    let mut vim = zoned_vim();
    press(&mut vim, '3', Position::new(5, 0));
    press(&mut vim, 'g', Position::new(5, 0));
    let actions = press(&mut vim, 'g', Position::new(5, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(2, 0)));
}

#[test]
fn test_raw_count_g_means_row_k_minus_1() {
    let mut vim = zoned_vim();
    press(&mut vim, '5', Position::new(0, 0));
    let actions = press(&mut vim, 'G', Position::new(0, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(4, 0)));
}

#[test]
fn test_count_g_clamped_to_last_row() {
    let mut vim = zoned_vim();
    press(&mut vim, '9', Position::new(0, 0));
    press(&mut vim, '9', Position::new(0, 0));
    let actions = press(&mut vim, 'G', Position::new(0, 0));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(7, 0)));
}

// ============================================================================
// 4. OPERATORS
// ============================================================================

#[test]
fn test_count_then_operator_then_motion() {
    // 3dl: delete 3 cells right of the cursor
    let mut vim = zoned_vim();
    let cursor = Position::new(0, 2);
    press(&mut vim, '3', cursor);
    press(&mut vim, 'd', cursor);
    assert_eq!(vim.count(), Some(3));

    let actions = press(&mut vim, 'l', cursor);
    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.start, Position::new(0, 2));
    assert_eq!(range.end, Position::new(0, 4));
    assert_eq!(range.kind, RangeKind::Char);
    assert_eq!(vim.mode(), VimMode::Normal);
}

#[test]
fn test_delete_emits_yank_then_delete() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(0, 0));
    let actions = press(&mut vim, 'l', Position::new(0, 0));

    let yank_idx = actions
        .iter()
        .position(|a| matches!(a, VimAction::Yank(_)))
        .unwrap();
    let delete_idx = actions
        .iter()
        .position(|a| matches!(a, VimAction::Delete(_)))
        .unwrap();
    assert!(yank_idx < delete_idx);
}

#[test]
fn test_yank_does_not_delete() {
    let mut vim = zoned_vim();
    press(&mut vim, 'y', Position::new(0, 0));
    let actions = press(&mut vim, 'w', Position::new(0, 0));

    assert!(get_yank_range(&actions).is_some());
    assert!(get_delete_range(&actions).is_none());
}

#[test]
fn test_dd_linewise_on_count_rows() {
    let mut vim = zoned_vim();
    let cursor = Position::new(2, 5);
    press(&mut vim, '2', cursor);
    press(&mut vim, 'd', cursor);
    let actions = press(&mut vim, 'd', cursor);

    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.kind, RangeKind::Line);
    assert_eq!(range.start, Position::new(2, 0));
    assert_eq!(range.end, Position::new(3, 15));
}

#[test]
fn test_yy_linewise_yank() {
    let mut vim = zoned_vim();
    press(&mut vim, 'y', Position::new(1, 3));
    let actions = press(&mut vim, 'y', Position::new(1, 3));

    let range = get_yank_range(&actions).unwrap();
    assert_eq!(range.kind, RangeKind::Line);
    assert!(get_delete_range(&actions).is_none());
}

#[test]
fn test_operator_switch_keeps_pending_and_clears_count() {
    let mut vim = zoned_vim();
    press(&mut vim, '2', Position::new(0, 0));
    press(&mut vim, 'd', Position::new(0, 0));
    press(&mut vim, 'y', Position::new(0, 0));

    assert_eq!(vim.mode(), VimMode::OperatorPending);
    assert_eq!(vim.operator(), Some(Operator::Yank));
    assert_eq!(vim.count(), None);
}

#[test]
fn test_dj_is_linewise() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(1, 7));
    let actions = press(&mut vim, 'j', Position::new(1, 7));

    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.kind, RangeKind::Line);
    assert_eq!(range.start, Position::new(1, 0));
    assert_eq!(range.end, Position::new(2, 15));
}

#[test]
fn test_dk_is_linewise_upward() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(3, 7));
    let actions = press(&mut vim, 'k', Position::new(3, 7));

    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.kind, RangeKind::Line);
    assert_eq!(range.start, Position::new(2, 0));
    assert_eq!(range.end, Position::new(3, 15));
}

#[test]
fn test_d_dollar_inclusive() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(0, 5));
    let actions = press(&mut vim, '$', Position::new(0, 5));

    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.start, Position::new(0, 5));
    assert_eq!(range.end, Position::new(0, 15));
}

#[test]
fn test_d_zero_backward() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(0, 5));
    let actions = press(&mut vim, '0', Position::new(0, 5));

    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.start, Position::new(0, 0));
    assert_eq!(range.end, Position::new(0, 5));
}

#[test]
fn test_de_inclusive() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(0, 0));
    let actions = press(&mut vim, 'e', Position::new(0, 0));

    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.start, Position::new(0, 0));
    assert_eq!(range.end, Position::new(0, 3));
}

#[test]
fn test_dh_backward_char() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(0, 5));
    let actions = press(&mut vim, 'h', Position::new(0, 5));

    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.start, Position::new(0, 4));
    assert_eq!(range.end, Position::new(0, 5));
}

#[test]
fn test_dw_crossing_rows_truncates_inclusive() {
    // w from col 14 wraps to the next row; the operator range must stop
    // at the end of the cursor row instead of eating the next row's cells
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(0, 14));
    let actions = press(&mut vim, 'w', Position::new(0, 14));

    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.start, Position::new(0, 14));
    assert_eq!(range.end, Position::new(0, 15));
    assert_eq!(range.kind, RangeKind::Char);
}

#[test]
fn test_dgg_linewise_to_top() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(3, 5));
    press(&mut vim, 'g', Position::new(3, 5));
    let actions = press(&mut vim, 'g', Position::new(3, 5));

    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.kind, RangeKind::Line);
    assert_eq!(range.start, Position::new(0, 0));
    assert_eq!(range.end, Position::new(3, 15));
}

#[test]
fn test_dl_at_right_edge_is_noop() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(0, 15));
    let actions = press(&mut vim, 'l', Position::new(0, 15));

    assert!(get_delete_range(&actions).is_none());
    assert_eq!(vim.mode(), VimMode::Normal);
}

#[test]
fn test_unknown_key_in_operator_pending_resets() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(0, 0));
    let actions = press(&mut vim, 'z', Position::new(0, 0));

    assert!(get_delete_range(&actions).is_none());
    assert_eq!(vim.mode(), VimMode::Normal);
    assert_eq!(vim.operator(), None);
}

// ============================================================================
// 5. VISUAL MODES
// ============================================================================

#[test]
fn test_visual_motion_extends_selection() {
    let mut vim = zoned_vim();
    let anchor = Position::new(1, 2);
    press(&mut vim, 'v', anchor);
    let actions = press(&mut vim, 'l', anchor);

    let pos = get_cursor_move(&actions).unwrap();
    assert_eq!(pos, Position::new(1, 3));
    let selection = vim.get_selection(pos).unwrap();
    assert_eq!(selection.start, anchor);
    assert_eq!(selection.end, pos);
    assert_eq!(selection.kind, RangeKind::Char);
}

#[test]
fn test_visual_d_operates_on_selection() {
    let mut vim = zoned_vim();
    press(&mut vim, 'v', Position::new(1, 2));
    press(&mut vim, 'l', Position::new(1, 2));
    let actions = press(&mut vim, 'd', Position::new(1, 3));

    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.start, Position::new(1, 2));
    assert_eq!(range.end, Position::new(1, 3));
    assert_eq!(vim.mode(), VimMode::Normal);
    assert_eq!(vim.visual_anchor(), None);
}

#[test]
fn test_visual_block_kind() {
    let mut vim = zoned_vim();
    press_ctrl(&mut vim, 'v', Position::new(1, 2));
    press(&mut vim, 'j', Position::new(1, 2));
    let actions = press(&mut vim, 'y', Position::new(2, 2));

    let range = get_yank_range(&actions).unwrap();
    assert_eq!(range.kind, RangeKind::Block);
}

#[test]
fn test_visual_x_deletes_selection() {
    let mut vim = zoned_vim();
    press(&mut vim, 'v', Position::new(0, 0));
    let actions = press(&mut vim, 'x', Position::new(0, 2));

    assert!(get_yank_range(&actions).is_some());
    assert!(get_delete_range(&actions).is_some());
}

#[test]
fn test_v_in_visual_cancels() {
    let mut vim = zoned_vim();
    press(&mut vim, 'v', Position::new(0, 0));
    press(&mut vim, 'v', Position::new(0, 0));
    assert_eq!(vim.mode(), VimMode::Normal);
    assert_eq!(vim.visual_anchor(), None);
}

#[test]
fn test_visual_mode_switch_preserves_anchor() {
    let mut vim = zoned_vim();
    let anchor = Position::new(2, 3);
    press(&mut vim, 'v', anchor);
    press_ctrl(&mut vim, 'v', Position::new(3, 5));
    assert_eq!(vim.mode(), VimMode::VisualBlock);
    assert_eq!(vim.visual_anchor(), Some(anchor));

    press(&mut vim, 'v', Position::new(3, 5));
    assert_eq!(vim.mode(), VimMode::Visual);
    assert_eq!(vim.visual_anchor(), Some(anchor));
}

#[test]
fn test_ctrl_v_in_block_cancels() {
    let mut vim = zoned_vim();
    press_ctrl(&mut vim, 'v', Position::new(0, 0));
    press_ctrl(&mut vim, 'v', Position::new(0, 0));
    assert_eq!(vim.mode(), VimMode::Normal);
}

#[test]
fn test_visual_gg_extends_to_top() {
    let mut vim = zoned_vim();
    press(&mut vim, 'v', Position::new(4, 3));
    press(&mut vim, 'g', Position::new(4, 3));
    let actions = press(&mut vim, 'g', Position::new(4, 3));

    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 3)));
    assert_eq!(vim.mode(), VimMode::Visual);
}

// ============================================================================
// 6. DOT REPEAT
// ============================================================================

#[test]
fn test_dot_repeats_operator_motion() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(0, 0));
    press(&mut vim, 'l', Position::new(0, 0));

    let actions = press(&mut vim, '.', Position::new(0, 4));
    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.start, Position::new(0, 4));
    assert_eq!(range.end, Position::new(0, 4));
}

#[test]
fn test_dot_repeats_with_stored_count() {
    let mut vim = zoned_vim();
    press(&mut vim, '3', Position::new(0, 0));
    press(&mut vim, 'd', Position::new(0, 0));
    press(&mut vim, 'l', Position::new(0, 0));

    let actions = press(&mut vim, '.', Position::new(0, 5));
    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.start, Position::new(0, 5));
    assert_eq!(range.end, Position::new(0, 7));
}

#[test]
fn test_dot_honors_fresh_count_prefix() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(0, 0));
    press(&mut vim, 'l', Position::new(0, 0));

    press(&mut vim, '2', Position::new(0, 5));
    let actions = press(&mut vim, '.', Position::new(0, 5));
    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.end, Position::new(0, 6));
}

#[test]
fn test_dot_repeats_dd() {
    let mut vim = zoned_vim();
    press(&mut vim, 'd', Position::new(0, 0));
    press(&mut vim, 'd', Position::new(0, 0));

    let actions = press(&mut vim, '.', Position::new(3, 0));
    let range = get_delete_range(&actions).unwrap();
    assert_eq!(range.kind, RangeKind::Line);
    assert_eq!(range.start.row, 3);
}

#[test]
fn test_dot_repeats_toggle() {
    let mut vim = zoned_vim();
    press(&mut vim, 'x', Position::new(0, 0));
    let actions = press(&mut vim, '.', Position::new(0, 5));
    assert!(has_action(&actions, |a| matches!(a, VimAction::Toggle)));
}

#[test]
fn test_dot_repeats_paste() {
    let mut vim = zoned_vim();
    press(&mut vim, 'P', Position::new(0, 0));
    let actions = press(&mut vim, '.', Position::new(0, 5));
    assert!(has_action(&actions, |a| matches!(a, VimAction::PasteBefore)));
}

// ============================================================================
// 7. REGISTERS AND JUMPLIST ACTIONS
// ============================================================================

#[test]
fn test_register_selection_prefix() {
    let mut vim = zoned_vim();
    press(&mut vim, '"', Position::new(0, 0));
    let actions = press(&mut vim, '3', Position::new(0, 0));

    assert!(has_action(&actions, |a| matches!(
        a,
        VimAction::SelectRegister(RegisterName::Numbered(3))
    )));
    // The digit was consumed by the register prefix, not the count
    assert_eq!(vim.count(), None);
}

#[test]
fn test_register_prefix_cancelled_by_non_register_key() {
    let mut vim = zoned_vim();
    press(&mut vim, '"', Position::new(0, 0));
    let actions = press(&mut vim, 'z', Position::new(0, 0));
    assert!(actions.is_empty());
    assert_eq!(vim.mode(), VimMode::Normal);
}

#[test]
fn test_jumplist_keys() {
    let mut vim = zoned_vim();
    let actions = press_ctrl(&mut vim, 'o', Position::new(0, 0));
    assert!(has_action(&actions, |a| matches!(a, VimAction::JumpBack)));

    let actions = press_ctrl(&mut vim, 'i', Position::new(0, 0));
    assert!(has_action(&actions, |a| matches!(a, VimAction::JumpForward)));
}

#[test]
fn test_paste_keys() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'p', Position::new(0, 0));
    assert!(has_action(&actions, |a| matches!(a, VimAction::Paste)));

    let actions = press(&mut vim, 'P', Position::new(0, 0));
    assert!(has_action(&actions, |a| matches!(a, VimAction::PasteBefore)));
}

#[test]
fn test_toggle_keys() {
    let mut vim = zoned_vim();
    let actions = press(&mut vim, 'x', Position::new(0, 0));
    assert!(has_action(&actions, |a| matches!(a, VimAction::Toggle)));

    let actions = press(&mut vim, '\r', Position::new(0, 0));
    assert!(has_action(&actions, |a| matches!(a, VimAction::Toggle)));
}

#[test]
fn test_half_page_scroll() {
    let mut vim = zoned_vim();
    let actions = press_ctrl(&mut vim, 'd', Position::new(0, 3));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(4, 3)));

    let actions = press_ctrl(&mut vim, 'u', Position::new(4, 3));
    assert_eq!(get_cursor_move(&actions), Some(Position::new(0, 3)));
}

// ============================================================================
// Range containment (used by selection rendering and data collection)
// ============================================================================

#[test]
fn test_block_range_contains_rectangle() {
    let range = Range {
        start: Position::new(3, 5),
        end: Position::new(1, 2),
        kind: RangeKind::Block,
    };

    assert!(range.contains(Position::new(2, 3)));
    assert!(range.contains(Position::new(1, 2)));
    assert!(range.contains(Position::new(3, 5)));
    assert!(!range.contains(Position::new(0, 3)));
    assert!(!range.contains(Position::new(2, 6)));
}

#[test]
fn test_line_range_contains_whole_rows() {
    let range = Range {
        start: Position::new(2, 0),
        end: Position::new(3, 15),
        kind: RangeKind::Line,
    };

    assert!(range.contains(Position::new(2, 0)));
    assert!(range.contains(Position::new(3, 9)));
    assert!(!range.contains(Position::new(4, 0)));
}

#[test]
fn test_char_range_directional_columns() {
    let range = Range {
        start: Position::new(1, 10),
        end: Position::new(2, 3),
        kind: RangeKind::Char,
    };

    assert!(range.contains(Position::new(1, 12)));
    assert!(!range.contains(Position::new(1, 5)));
    assert!(range.contains(Position::new(2, 0)));
    assert!(!range.contains(Position::new(2, 7)));
}
