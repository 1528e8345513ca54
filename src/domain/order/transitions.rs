use super::value_objects::OrderStatus;

// ============================================================================
// Order Lifecycle Transition Table
// ============================================================================
//
// Pure, total over every (from, to) pair. The legal edges:
//
//   pending   -> confirmed | cancelled
//   confirmed -> paid      | cancelled
//   paid      -> shipped
//   shipped   -> delivered
//
// Terminal states have no outgoing edges. Self-transitions are absent from
// every allowed set, so a repeated identical status is rejected rather than
// treated as an idempotent no-op.
//
// ============================================================================

/// Answer whether the lifecycle state machine permits `from -> to`.
pub fn is_transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_targets(from).contains(&to)
}

fn allowed_targets(from: OrderStatus) -> &'static [OrderStatus] {
    match from {
        OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
        OrderStatus::Confirmed => &[OrderStatus::Paid, OrderStatus::Cancelled],
        OrderStatus::Paid => &[OrderStatus::Shipped],
        OrderStatus::Shipped => &[OrderStatus::Delivered],
        OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Failed => &[],
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_table_is_exhaustive_over_all_pairs() {
        // The full 49-pair table: every edge not listed here must be rejected.
        let legal = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Paid),
            (Confirmed, Cancelled),
            (Paid, Shipped),
            (Shipped, Delivered),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    is_transition_allowed(from, to),
                    expected,
                    "transition {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_self_transitions_are_rejected() {
        for status in OrderStatus::ALL {
            assert!(!is_transition_allowed(status, status), "{status} -> {status}");
        }
    }

    #[test]
    fn test_terminal_states_have_no_outgoing_edges() {
        for from in OrderStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in OrderStatus::ALL {
                assert!(!is_transition_allowed(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_happy_path_is_legal_step_by_step() {
        let path = [Pending, Confirmed, Paid, Shipped, Delivered];
        for pair in path.windows(2) {
            assert!(is_transition_allowed(pair[0], pair[1]));
        }
        assert!(!is_transition_allowed(Delivered, Pending));
    }
}
