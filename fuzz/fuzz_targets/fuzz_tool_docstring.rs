#![no_main]
use libfuzzer_sys::fuzz_target;
use llm_npc::tools::{Callable, Param};

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = std::str::from_utf8(data) {
        let _ = llm_npc::tools::schema::parse_param_descriptions(doc);

        let callable = Callable::new("probe")
            .doc(doc)
            .param(Param::new("target").typed(doc))
            .tool();
        if let Some(descriptor) = callable.descriptor() {
            assert!(!descriptor.description.is_empty());
            assert_eq!(descriptor.parameters.len(), 1);
        }
    }
});
