//! History bounding.

use wrenchwise_core::ConversationTurn;

/// The most recent `limit` turns, in original order.
pub fn truncate(history: &[ConversationTurn], limit: usize) -> &[ConversationTurn] {
    &history[history.len().saturating_sub(limit)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(len: usize) -> Vec<ConversationTurn> {
        (0..len)
            .map(|i| {
                if i % 2 == 0 {
                    ConversationTurn::user(format!("q{i}"))
                } else {
                    ConversationTurn::model(format!("a{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn keeps_a_contiguous_suffix() {
        for len in [0, 1, 19, 20, 21, 45] {
            let turns = history(len);
            let kept = truncate(&turns, 20);
            assert_eq!(kept.len(), len.min(20));
            assert_eq!(kept, &turns[len - kept.len()..]);
        }
    }

    #[test]
    fn borrows_without_copying() {
        let turns = history(30);
        let kept = truncate(&turns, 5);
        assert!(std::ptr::eq(&kept[0], &turns[25]));
        assert_eq!(kept[4].text(), "a29");
    }
}
