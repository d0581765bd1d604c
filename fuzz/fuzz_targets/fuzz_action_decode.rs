#![no_main]
use libfuzzer_sys::fuzz_target;
use llm_npc::response::ActionResult;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data) {
        if let Ok(result) = ActionResult::from_json(body) {
            // A decoded result must never break the error/success pairing.
            assert!(result.success || result.error.is_some());
            let flattened = result.tool_calls().count();
            let total: usize = result.rounds.iter().map(|r| r.tool_calls.len()).sum();
            assert_eq!(flattened, total);
        }
    }
});
