//! End-to-end behaviour of the default paths and caller-built compositions.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use memory::InMemoryStore;
use nodes::{FunctionCatalog, Orchestrator, StageCatalog, PERCEIVE, UNDERSTAND};
use pipeline::{
    compose, compose_named, Computation, Content, EchoInference, Elaboration, Evolution, Evolve,
    Experience, Generation, InferenceBoundary, InferenceDescriptor, InferenceError,
    Interpretation, MemoryError, MemorySink, MemoryTrace, PipelineError, StageName, TraceId,
    TraceKind,
};
use serde_json::Value;

const RAYLEIGH: &str = "The sky is blue because of Rayleigh scattering";

struct UnavailableInference;

#[async_trait]
impl InferenceBoundary for UnavailableInference {
    async fn infer(&self, _experience: &Experience) -> Result<Interpretation, InferenceError> {
        Err(InferenceError::Provider {
            status: 503,
            message: "unavailable".into(),
        })
    }

    fn descriptor(&self) -> InferenceDescriptor {
        InferenceDescriptor {
            model: "unavailable".into(),
            ..InferenceDescriptor::default()
        }
    }
}

#[derive(Default)]
struct RejectingSink {
    attempts: AtomicUsize,
}

#[async_trait]
impl MemorySink for RejectingSink {
    async fn encode(&self, _content: Value, _kind: TraceKind) -> Result<TraceId, MemoryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MemoryError::Unavailable {
            message: "closed".into(),
        })
    }

    async fn consolidate(&self) -> Result<usize, MemoryError> {
        Ok(0)
    }

    async fn retrieve(&self, _cue: &str) -> Result<Vec<MemoryTrace>, MemoryError> {
        Ok(Vec::new())
    }
}

fn counted_stage(name: &str, calls: &Arc<AtomicUsize>) -> Evolution {
    let calls = Arc::clone(calls);
    let label = name.to_owned();
    Computation::builder(name, move |_: Option<&Elaboration>| {
        calls.fetch_add(1, Ordering::SeqCst);
        format!("ask {label}")
    })
    .build()
    .unwrap()
    .into()
}

fn sources(experience: &Experience) -> Vec<String> {
    std::iter::once(experience)
        .chain(experience.ancestors())
        .map(|node| node.source().to_string())
        .collect()
}

#[tokio::test]
async fn understand_produces_one_node_per_member() {
    let orchestrator = Orchestrator::echo().unwrap();

    let result = orchestrator.process(RAYLEIGH).await.unwrap();

    assert_eq!(result.depth(), 3);
    assert_eq!(
        sources(&result),
        vec!["recollection", "comprehension", "perception", StageName::ORIGIN]
    );
    assert!(result.ancestors().last().unwrap().previous().is_none());

    let mut seen = HashSet::new();
    for node in std::iter::once(&result).chain(result.ancestors()) {
        assert!(seen.insert(node as *const Experience), "cycle in experience chain");
    }
}

#[tokio::test]
async fn every_macro_node_is_answered_before_the_next_starts() {
    let orchestrator = Orchestrator::echo().unwrap();

    let result = orchestrator.process_on(UNDERSTAND, RAYLEIGH).await.unwrap();

    for node in std::iter::once(&result).chain(result.ancestors()) {
        if node.source().as_str() == StageName::ORIGIN {
            assert!(node.interpretation().is_none());
            continue;
        }
        let interpretation = node.interpretation().unwrap();
        assert_eq!(interpretation.source, format!("echo-{}", node.source()));
        assert_eq!(node.origin().and_then(|o| o.as_text()), Some(RAYLEIGH));
    }
}

#[tokio::test]
async fn perceive_runs_one_function() {
    let orchestrator = Orchestrator::echo().unwrap();

    let result = orchestrator.process_on(PERCEIVE, RAYLEIGH).await.unwrap();

    assert_eq!(result.depth(), 1);
    assert_eq!(
        result.elaboration().unwrap().sources(),
        vec!["sensation", "sensory-gating", "feature-detection", "pattern-recognition"]
    );
}

#[tokio::test]
async fn unknown_path_is_a_configuration_error() {
    let orchestrator = Orchestrator::echo().unwrap();

    let err = orchestrator.process_on("imagine", RAYLEIGH).await.unwrap_err();

    assert!(err.is_configuration());
}

#[tokio::test]
async fn micro_composition_builds_n_links_in_order() {
    let stages = StageCatalog::new().unwrap();
    let members: Vec<Evolution> = vec![
        stages.sensation.clone().into(),
        stages.sensory_gating.clone().into(),
        stages.feature_detection.clone().into(),
        stages.pattern_recognition.clone().into(),
        stages.semantic_encoding.clone().into(),
    ];
    let path = compose(members).unwrap();

    let result = path.evolve(Experience::from_origin(RAYLEIGH)).await.unwrap();

    let elaboration = result.elaboration().unwrap();
    assert_eq!(elaboration.depth(), 5);
    assert_eq!(
        elaboration.sources(),
        vec![
            "sensation",
            "sensory-gating",
            "feature-detection",
            "pattern-recognition",
            "semantic-encoding"
        ]
    );
    assert_eq!(result.depth(), 0);
    assert!(result.interpretation().is_none());
}

#[tokio::test]
async fn mixed_composition_fails_before_any_stage_runs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let functions =
        FunctionCatalog::new(&StageCatalog::new().unwrap(), Arc::new(EchoInference)).unwrap();

    let err = compose(vec![
        counted_stage("a", &calls),
        functions.perception.into(),
    ])
    .unwrap_err();

    assert!(matches!(err, PipelineError::CategoryMismatch { .. }));
    assert!(err.is_configuration());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn deterministic_stages_feeding_a_generative_stage_echo_their_chain() {
    let calls = Arc::new(AtomicUsize::new(0));
    let gather = compose_named("gather", vec![counted_stage("a", &calls), counted_stage("b", &calls)])
        .unwrap();
    let closing = Generation::new("closing", Vec::new(), Arc::new(EchoInference)).unwrap();
    let path = compose(vec![gather, closing.into()]).unwrap();

    let result = path.evolve(Experience::from_origin(RAYLEIGH)).await.unwrap();

    let echoed = result.interpretation().unwrap().content.as_elaboration().unwrap();
    assert_eq!(echoed.sources(), vec!["a", "b"]);
    assert_eq!(echoed.chain()[0].prompt(), "ask a");
    assert_eq!(echoed.chain()[1].prompt(), "ask b");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rerunning_a_path_yields_identical_chains() {
    let orchestrator = Orchestrator::echo().unwrap();

    let first = orchestrator.process(RAYLEIGH).await.unwrap();
    let second = orchestrator.process(RAYLEIGH).await.unwrap();

    let first_nodes: Vec<&Experience> = std::iter::once(&first).chain(first.ancestors()).collect();
    let second_nodes: Vec<&Experience> =
        std::iter::once(&second).chain(second.ancestors()).collect();
    assert_eq!(first_nodes.len(), second_nodes.len());
    for (a, b) in first_nodes.iter().zip(&second_nodes) {
        assert_eq!(a.source(), b.source());
        assert_eq!(a.elaboration(), b.elaboration());
        assert_eq!(
            a.interpretation().map(|i| &i.content),
            b.interpretation().map(|i| &i.content)
        );
    }
}

#[tokio::test]
async fn rayleigh_scenario_links_the_generative_stage_to_the_gathered_node() {
    let stages = StageCatalog::new().unwrap();
    let gather = compose_named(
        "gather",
        vec![
            stages.sensation.clone().into(),
            stages.pattern_recognition.clone().into(),
        ],
    )
    .unwrap();
    let closing = Generation::new("comprehension", Vec::new(), Arc::new(EchoInference)).unwrap();
    let path = compose(vec![gather.clone(), closing.into()]).unwrap();
    let origin = Experience::from_origin(RAYLEIGH);

    let gathered = gather
        .evolve(Experience::following(gather.name().clone(), origin.clone()))
        .await
        .unwrap();
    let result = path.evolve(origin.clone()).await.unwrap();

    // Nodes are stamped when created, so compare everything but the timestamp.
    let before = result.previous().unwrap();
    assert_eq!(before.source(), gathered.source());
    assert_eq!(before.origin(), gathered.origin());
    assert_eq!(before.elaboration(), gathered.elaboration());
    assert_eq!(before.interpretation(), None);
    assert_eq!(before.previous(), gathered.previous());
    assert_eq!(before.previous().unwrap().as_ref(), &origin);
    assert_eq!(
        before.metadata().keys().collect::<Vec<_>>(),
        gathered.metadata().keys().collect::<Vec<_>>()
    );

    assert_eq!(result.depth(), 2);
    assert_eq!(result.interpretation().unwrap().source, "echo-comprehension");
    assert_eq!(
        result.interpretation().unwrap().content,
        Content::Elaboration(gathered.elaboration().unwrap().clone())
    );
}

#[tokio::test]
async fn micro_path_between_generative_stages_feeds_the_next_one() {
    let calls = Arc::new(AtomicUsize::new(0));
    let path = compose(vec![
        Generation::new("g1", Vec::new(), Arc::new(EchoInference)).unwrap().into(),
        compose_named("gather", vec![counted_stage("a", &calls), counted_stage("b", &calls)])
            .unwrap(),
        Generation::new("g2", Vec::new(), Arc::new(EchoInference)).unwrap().into(),
    ])
    .unwrap();

    let result = path.evolve(Experience::from_origin(RAYLEIGH)).await.unwrap();

    assert_eq!(result.depth(), 3);
    assert_eq!(sources(&result), vec!["g2", "gather", "g1", StageName::ORIGIN]);
    assert_eq!(result.elaboration().unwrap().sources(), vec!["a", "b"]);
    let echoed = result.interpretation().unwrap().content.as_elaboration().unwrap();
    assert_eq!(echoed.sources(), vec!["a", "b"]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let first = result.previous().unwrap().previous().unwrap();
    assert!(first.elaboration().is_none());
    let answer = first.interpretation().unwrap();
    assert_eq!(answer.source, "echo-g1");
    assert!(matches!(answer.content, Content::Structured(_)));
}

#[tokio::test]
async fn predecessor_dependent_stage_first_yields_no_experience() {
    let stages = StageCatalog::new().unwrap();
    let orchestrator = Orchestrator::echo().unwrap();
    let path = compose(vec![
        stages.sensory_gating.clone().into(),
        stages.feature_detection.clone().into(),
    ])
    .unwrap();

    let err = orchestrator.process_with(&path, RAYLEIGH).await.unwrap_err();

    match err {
        PipelineError::MissingPredecessorElaboration { stage, expected } => {
            assert_eq!(stage.as_str(), "sensory-gating");
            assert_eq!(expected.as_str(), "sensation");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn boundary_failure_stops_the_run() {
    let sink = Arc::new(InMemoryStore::new());
    let orchestrator = Orchestrator::new(Arc::new(UnavailableInference))
        .unwrap()
        .with_memory(sink.clone());

    let err = orchestrator.process(RAYLEIGH).await.unwrap_err();

    match err {
        PipelineError::Boundary { stage, source } => {
            assert_eq!(stage.as_str(), "perception");
            assert!(matches!(source, InferenceError::Provider { status: 503, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sink.short_term_len().await, 0);
}

#[tokio::test]
async fn completed_runs_are_remembered_as_episodes() {
    let sink = Arc::new(InMemoryStore::new());
    let orchestrator = Orchestrator::echo().unwrap().with_memory(sink.clone());

    orchestrator.process_on(PERCEIVE, RAYLEIGH).await.unwrap();
    orchestrator.process_on(PERCEIVE, "Grass is green").await.unwrap();

    let traces = sink.retrieve("rayleigh").await.unwrap();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].kind, TraceKind::Episodic);
    assert_eq!(traces[0].content["path"], PERCEIVE);
    assert_eq!(traces[0].content["source"], "echo-perception");

    assert_eq!(sink.consolidate().await.unwrap(), 2);
    assert_eq!(sink.retrieve("").await.unwrap().len(), 2);
}

#[tokio::test]
async fn memory_failures_propagate() {
    let sink = Arc::new(RejectingSink::default());
    let orchestrator = Orchestrator::echo().unwrap().with_memory(sink.clone());

    let err = orchestrator.process(RAYLEIGH).await.unwrap_err();

    assert!(matches!(err, PipelineError::Memory(MemoryError::Unavailable { .. })));
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_runs_are_independent() {
    let orchestrator = Arc::new(Orchestrator::echo().unwrap());

    let handles: Vec<_> = ["first", "second", "third"]
        .into_iter()
        .map(|origin| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.process(origin).await })
        })
        .collect();

    for (handle, origin) in handles.into_iter().zip(["first", "second", "third"]) {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.depth(), 3);
        assert_eq!(result.origin().and_then(|o| o.as_text()), Some(origin));
    }
}
