//! Property-Based Tests for Turn Invariants
//!
//! Whatever mix of text and tool calls a response carries, every tool call
//! gets exactly one result, in the order the calls appeared.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use toolloop::{
    CatalogEntry, CompletionResponse, ContentBlock, Message, NoopDiagnostics, Role, StopReason,
    ToolDescriptor, ToolInvoker, TurnMachine, TurnRequest, TurnStatus, normalize_content,
};
use toolloop_testing::{MockGateway, MockToolBehavior, ScriptedCompletionClient};

// A response block: Some(n) is a tool call with argument n, None is text
fn block_strategy() -> impl Strategy<Value = Option<u32>> {
    prop_oneof![Just(None), any::<u32>().prop_map(Some)]
}

fn response(blocks: &[Option<u32>]) -> CompletionResponse {
    let content = blocks
        .iter()
        .enumerate()
        .map(|(i, block)| match block {
            Some(n) => ContentBlock::tool_use(format!("toolu_{i}"), "echo", json!({ "n": n })),
            None => ContentBlock::text(format!("thinking {i}")),
        })
        .collect();
    CompletionResponse::new(content, Some(StopReason::ToolUse))
}

fn machine(client: ScriptedCompletionClient, gateway: MockGateway) -> TurnMachine {
    let tools = vec![ToolDescriptor::new("echo", json!({"type": "object"}))];
    let invoker = ToolInvoker::new(Arc::new(gateway), Arc::new(NoopDiagnostics));
    TurnMachine::new(Arc::new(client), invoker, tools, Arc::new(NoopDiagnostics))
}

proptest! {
    /// Property: N tool calls produce N results in call order
    #[test]
    fn prop_tool_results_follow_call_order(
        blocks in prop::collection::vec(block_strategy(), 1..12)
    ) {
        let gateway = MockGateway::new()
            .with_tool(CatalogEntry::new("echo", json!({"type": "object"})))
            .with_behavior("echo", MockToolBehavior::Respond(json!("ok")));
        let client = ScriptedCompletionClient::new().with_response(response(&blocks));
        let machine = machine(client, gateway.clone());

        let outcome = tokio_test::block_on(machine.run_turn(
            &TurnRequest::new("claude-test"),
            vec![Message::user("go")],
            0,
        ));
        let outcome = outcome.map_err(|e| TestCaseError::fail(e.to_string()))?;

        let expected_ids: Vec<String> = blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.is_some())
            .map(|(i, _)| format!("toolu_{i}"))
            .collect();
        let expected_args: Vec<_> = blocks.iter().flatten().map(|n| json!({ "n": n })).collect();

        let messages = &outcome.stage.messages;
        if expected_ids.is_empty() {
            // No tool calls: tool_use stop without blocks asks the model again.
            prop_assert_eq!(outcome.status, TurnStatus::Continue);
            prop_assert_eq!(messages.len(), 2);
        } else {
            prop_assert_eq!(outcome.status, TurnStatus::Continue);
            prop_assert_eq!(messages.len(), 3);
            let results = &messages[2];
            prop_assert_eq!(results.role, Role::User);

            let ids: Vec<String> = results
                .content
                .iter()
                .filter_map(|block| block.tool_use_id().map(str::to_string))
                .collect();
            prop_assert_eq!(ids, expected_ids);
            prop_assert!(results.content.iter().all(|block| !block.is_error()));

            let args: Vec<_> = gateway.calls().into_iter().map(|c| c.arguments).collect();
            prop_assert_eq!(args, expected_args);
        }
        // The assistant message is reported; tool results wait for the next call.
        prop_assert_eq!(outcome.stage.index, 2);
    }

    /// Property: normalization never changes plain scalars
    #[test]
    fn prop_normalize_keeps_scalars(n in any::<i64>(), s in ".{0,32}") {
        prop_assert_eq!(normalize_content(json!(n)), json!(n));
        prop_assert_eq!(normalize_content(json!(s.clone())), json!(s));
    }
}
