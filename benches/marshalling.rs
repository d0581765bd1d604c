use criterion::{black_box, criterion_group, criterion_main, Criterion};
use llm_npc::context::{ActInput, ContextBuilder, KnowledgeGraph};
use llm_npc::response::ActionResult;
use llm_npc::tools::{extract, Callable, Param};
use serde_json::json;

fn bench_extract(c: &mut Criterion) {
    let give_item = Callable::new("give_item")
        .doc(
            "Hand an item to another character.\n\n\
             Args:\n    item: Item to give\n    target (str): Who receives it\n    \
             quantity: How many\n\nReturns:\n    Confirmation text",
        )
        .param(Param::new("self"))
        .param(Param::new("item").typed("str"))
        .param(Param::new("target").typed("Optional[str]").with_default())
        .param(Param::new("quantity").typed("int").with_default());

    c.bench_function("extract_tool_descriptor", |b| {
        b.iter(|| extract(black_box(&give_item), None));
    });
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_plain_inputs", |b| {
        b.iter(|| {
            ActInput::new(black_box(vec!["Bar counter", "Crackling fire", "Locked door"]))
                .with_events(["A stranger walks in", "Thunder outside"])
                .normalize()
        });
    });

    let graph = KnowledgeGraph::new()
        .add_node("elara", [("type", json!("person"))])
        .add_node("pony", [("type", json!("place"))])
        .add_edge("elara", "pony", [("relation", json!("owns"))]);
    c.bench_function("normalize_context_builder", |b| {
        b.iter(|| {
            let context = ContextBuilder::new()
                .add_surrounding("Bar counter", "Polished oak, sticky with ale")
                .add_event("arrival", "A stranger walks in")
                .set_knowledge_graph(graph.clone());
            ActInput::from(context).normalize()
        });
    });
}

fn bench_decode(c: &mut Criterion) {
    let body = json!({
        "success": true,
        "llm_response": "  Welcome to the Prancing Pony!  ",
        "rounds": [
            {"round_number": 1, "tools_used": [
                {"tool_name": "speak", "args": {"message": "Welcome!"}, "success": true, "response": "spoken"},
                {"tool_name": "move_to", "args": {"location": "bar"}, "success": true}
            ]},
            {"round_number": 2, "tools_used": [
                {"tool_name": "give_item", "args": {"item": "ale", "target": "stranger"}, "success": false, "result": ""}
            ]}
        ]
    })
    .to_string();

    c.bench_function("decode_action_result", |b| {
        b.iter(|| ActionResult::from_json(black_box(&body)));
    });
}

criterion_group!(benches, bench_extract, bench_normalize, bench_decode);
criterion_main!(benches);
