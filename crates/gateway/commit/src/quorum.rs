//! Quorum evaluation over a proposal response set.
//!
//! Acceptance is unanimous: every expected node must answer with a success
//! status. There is no partial-quorum mode.

use gateway_types::{NodeId, NodeResponse, QuorumVerdict};

/// Decide whether a proposal is endorsed.
///
/// `expected` is the size of the target set. A short set is rejected even if
/// every entry present succeeded; callers should pad it with
/// [`complete_response_set`] so the missing nodes are named in the reasons.
pub fn evaluate(responses: &[NodeResponse], expected: usize) -> QuorumVerdict {
    let mut reasons: Vec<String> = responses
        .iter()
        .filter(|response| !response.is_success())
        .map(NodeResponse::describe_failure)
        .collect();

    if responses.len() != expected {
        reasons.push(format!(
            "expected {} responses, received {}",
            expected,
            responses.len()
        ));
    }

    if expected == 0 {
        reasons.push("no endorsing nodes".to_string());
    }

    if reasons.is_empty() {
        QuorumVerdict::accept()
    } else {
        QuorumVerdict::reject(reasons)
    }
}

/// Add an explicit failing entry for every target with no response.
///
/// The result is ordered by target; responses from nodes outside the target
/// set are kept at the end.
pub fn complete_response_set(
    targets: &[NodeId],
    mut responses: Vec<NodeResponse>,
) -> Vec<NodeResponse> {
    let mut completed = Vec::with_capacity(targets.len().max(responses.len()));

    for target in targets {
        match responses.iter().position(|r| &r.node == target) {
            Some(index) => completed.push(responses.remove(index)),
            None => completed.push(NodeResponse::missing(target.clone())),
        }
    }

    completed.extend(responses);
    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ok(node: &str) -> NodeResponse {
        NodeResponse::ok(NodeId::new(node), b"sig".to_vec())
    }

    #[test]
    fn test_all_success_is_accepted() {
        let verdict = evaluate(&[ok("peer0"), ok("peer1")], 2);
        assert!(verdict.accepted);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn test_single_rejection_fails_quorum() {
        let responses = vec![
            ok("peer0"),
            NodeResponse::rejected(NodeId::new("peer1"), 500, "chaincode error"),
        ];
        let verdict = evaluate(&responses, 2);
        assert!(!verdict.accepted);
        assert_eq!(
            verdict.reasons,
            vec!["peer1 returned status 500: chaincode error".to_string()]
        );
    }

    #[test]
    fn test_short_response_set_is_rejected() {
        let verdict = evaluate(&[ok("peer0")], 2);
        assert!(!verdict.accepted);
    }

    #[test]
    fn test_empty_target_set_is_rejected() {
        assert!(!evaluate(&[], 0).accepted);
    }

    #[test]
    fn test_missing_nodes_are_padded_in_target_order() {
        let targets = vec![NodeId::new("peer0"), NodeId::new("peer1"), NodeId::new("peer2")];
        let completed = complete_response_set(&targets, vec![ok("peer2"), ok("peer0")]);

        let nodes: Vec<&str> = completed.iter().map(|r| r.node.as_str()).collect();
        assert_eq!(nodes, vec!["peer0", "peer1", "peer2"]);
        assert!(!completed[1].is_success());
        assert_eq!(completed[1].message, "no response from peer1");

        let verdict = evaluate(&completed, targets.len());
        assert!(!verdict.accepted);
        assert_eq!(verdict.reasons.len(), 1);
    }

    fn response_strategy() -> impl Strategy<Value = NodeResponse> {
        ("[a-z]{3,8}", prop_oneof![Just(200u16), 400u16..600u16]).prop_map(|(node, status)| {
            if status == 200 {
                NodeResponse::ok(NodeId::new(node), vec![1, 2, 3])
            } else {
                NodeResponse::rejected(NodeId::new(node), status, "failed")
            }
        })
    }

    proptest! {
        #[test]
        fn prop_accepted_iff_every_response_succeeds(
            responses in prop::collection::vec(response_strategy(), 1..12)
        ) {
            let verdict = evaluate(&responses, responses.len());
            let all_ok = responses.iter().all(NodeResponse::is_success);
            prop_assert_eq!(verdict.accepted, all_ok);
            prop_assert_eq!(
                verdict.reasons.len(),
                responses.iter().filter(|r| !r.is_success()).count()
            );
        }

        #[test]
        fn prop_evaluation_is_idempotent(
            responses in prop::collection::vec(response_strategy(), 0..12),
            expected in 0usize..12
        ) {
            prop_assert_eq!(evaluate(&responses, expected), evaluate(&responses, expected));
        }

        #[test]
        fn prop_a_missing_response_never_passes(
            responses in prop::collection::vec(response_strategy(), 1..12)
        ) {
            let verdict = evaluate(&responses[1..], responses.len());
            prop_assert!(!verdict.accepted);
        }
    }
}
