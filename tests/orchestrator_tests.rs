use async_trait::async_trait;
use futures_util::stream;
use roundtable::{
    host_channel, stream_from_messages, Agent, AgentError, AgentFactory, AgentSpec, ChatMessage,
    DirectorAgent, EngineConfig, HookError, MessageStream, NoopHooks, Orchestrator, Role,
    SessionHooks,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What a scripted agent does on its nth `produce` call; the last entry
/// repeats for all later calls.
#[derive(Clone)]
enum Turn {
    Say(Vec<ChatMessage>),
    Hang,
    SayThenHang(Vec<ChatMessage>),
}

struct ScriptedAgent {
    name: String,
    calls: AtomicUsize,
    turns: Vec<Turn>,
}

impl ScriptedAgent {
    fn new(name: &str, turns: Vec<Turn>) -> Arc<Self> {
        Arc::new(ScriptedAgent {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
            turns,
        })
    }

    fn says(name: &str, content: &str) -> Arc<Self> {
        Self::new(
            name,
            vec![Turn::Say(vec![ChatMessage::text(
                Role::Assistant,
                name,
                content,
            )])],
        )
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn produce(
        &self,
        _history: Vec<ChatMessage>,
        _max_rounds: usize,
    ) -> Result<MessageStream, AgentError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let turn = self.turns[call.min(self.turns.len() - 1)].clone();
        match turn {
            Turn::Say(messages) => Ok(stream_from_messages(messages)),
            Turn::Hang => Ok(Box::pin(stream::pending())),
            Turn::SayThenHang(messages) => Ok(Box::pin(futures_util::StreamExt::chain(
                stream::iter(messages.into_iter().map(Ok)),
                stream::pending(),
            ))),
        }
    }
}

/// Hands out pre-built agents by roster name.
struct MapFactory {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl MapFactory {
    fn of(agents: Vec<Arc<ScriptedAgent>>) -> Self {
        MapFactory {
            agents: agents
                .into_iter()
                .map(|a| (a.name.clone(), a as Arc<dyn Agent>))
                .collect(),
        }
    }
}

#[async_trait]
impl AgentFactory for MapFactory {
    async fn build(
        &self,
        spec: &AgentSpec,
        _roster: &[String],
        _credential: &str,
    ) -> Result<Arc<dyn Agent>, AgentError> {
        self.agents
            .get(&spec.name)
            .cloned()
            .ok_or_else(|| -> AgentError { format!("no backend for {}", spec.name).into() })
    }
}

/// A factory whose constructions always fail.
struct BrokenFactory;

#[async_trait]
impl AgentFactory for BrokenFactory {
    async fn build(
        &self,
        _spec: &AgentSpec,
        _roster: &[String],
        _credential: &str,
    ) -> Result<Arc<dyn Agent>, AgentError> {
        Err("backend unavailable".into())
    }
}

struct Recorder {
    seen: Mutex<Vec<String>>,
    completions: AtomicUsize,
}

impl Recorder {
    fn new() -> Arc<Self> {
        Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            completions: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SessionHooks for Recorder {
    async fn on_message_received(&self, message: &ChatMessage) -> Result<(), HookError> {
        self.seen
            .lock()
            .unwrap()
            .push(message.text_content().unwrap_or("").to_string());
        Ok(())
    }

    fn on_task_completed(&self) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }
}

fn config() -> EngineConfig {
    EngineConfig {
        retry_delay_ms: 10,
        ..EngineConfig::default()
    }
    .with_credential("mock", "secret")
}

fn spec(name: &str) -> AgentSpec {
    AgentSpec::new(name, "a test persona", "mock", "scripted-1")
}

async fn initialized(
    agents: Vec<Arc<ScriptedAgent>>,
    hooks: Arc<dyn SessionHooks>,
) -> Orchestrator {
    let specs: Vec<AgentSpec> = agents.iter().map(|a| spec(&a.name)).collect();
    let factory = MapFactory::of(agents);
    let mut orchestrator = Orchestrator::new(config(), hooks);
    orchestrator.initialize(&specs, &factory).await.unwrap();
    orchestrator
}

#[tokio::test]
async fn initialize_requires_credentials() {
    let mut orchestrator = Orchestrator::new(EngineConfig::default(), Arc::new(NoopHooks));
    let err = orchestrator
        .initialize(&[spec("Alice")], &MapFactory::of(vec![]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing credential"));
    assert!(!orchestrator.is_initialized());
    assert!(
        !orchestrator
            .start_task("go", 5, CancellationToken::new())
            .await
    );
}

#[tokio::test]
async fn initialize_rejects_empty_roster() {
    let mut orchestrator = Orchestrator::new(config(), Arc::new(NoopHooks));
    assert!(orchestrator
        .initialize(&[], &MapFactory::of(vec![]))
        .await
        .is_err());
    assert!(!orchestrator.is_initialized());
}

#[tokio::test]
async fn failed_agent_construction_leaves_orchestrator_uninitialized() {
    let mut orchestrator = Orchestrator::new(config(), Arc::new(NoopHooks));
    let err = orchestrator
        .initialize(&[spec("Alice")], &BrokenFactory)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Alice"));
    assert!(!orchestrator.is_initialized());
    assert!(orchestrator.roster_names().is_empty());
}

#[tokio::test]
async fn initialize_prepends_the_director() {
    let orchestrator = initialized(
        vec![ScriptedAgent::says("Alice", "hi"), ScriptedAgent::says("Bob", "yo")],
        Arc::new(NoopHooks),
    )
    .await;
    assert_eq!(
        orchestrator.roster_names(),
        vec![DirectorAgent::NAME, "Alice", "Bob"]
    );
}

#[tokio::test]
async fn start_task_streams_delivers_and_completes() {
    let alice = ScriptedAgent::says("Alice", "scene line [N:Bob]");
    let bob = ScriptedAgent::says("Bob", "reply line");
    let hooks = Recorder::new();
    let orchestrator = initialized(vec![alice, bob], hooks.clone()).await;

    let rounds = orchestrator.config().default_max_rounds;
    let ok = orchestrator
        .start_task(
            "[SYSTEM] Open the scene. [N:Alice]",
            rounds,
            CancellationToken::new(),
        )
        .await;

    assert!(ok);
    assert!(!orchestrator.is_processing());
    assert_eq!(
        *hooks.seen.lock().unwrap(),
        vec!["scene line [N:Bob]", "reply line"]
    );
    assert_eq!(hooks.completions.load(Ordering::SeqCst), 1);

    // history: task injection + both produced messages, in order
    let history = orchestrator.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].from(), DirectorAgent::NAME);
    assert_eq!(history[1].from(), "Alice");
    assert_eq!(history[2].from(), "Bob");
}

#[tokio::test]
async fn start_task_purges_prior_control_messages() {
    let alice = ScriptedAgent::says("Alice", "done");
    let orchestrator = initialized(vec![alice], Arc::new(NoopHooks)).await;

    orchestrator.append_message(ChatMessage::text(
        Role::Assistant,
        DirectorAgent::NAME,
        "[SYSTEM] old task [N:Alice]",
    ));
    orchestrator.append_message(ChatMessage::text(Role::Assistant, "Alice", "old reply"));

    assert!(
        orchestrator
            .start_task("[SYSTEM] new task [N:Alice]", 5, CancellationToken::new())
            .await
    );

    let history = orchestrator.history();
    let contents: Vec<&str> = history.iter().filter_map(|m| m.text_content()).collect();
    // the old [SYSTEM] injection is gone; the surviving entries keep order
    assert_eq!(contents, vec!["old reply", "[SYSTEM] new task [N:Alice]", "done"]);
}

#[tokio::test]
async fn second_start_task_is_rejected_without_side_effects() {
    let stuck = ScriptedAgent::new("Stuck", vec![Turn::Hang]);
    let orchestrator = Arc::new(initialized(vec![stuck], Arc::new(NoopHooks)).await);

    let runner = Arc::clone(&orchestrator);
    let first = tokio::spawn(async move {
        runner
            .start_task("go [N:Stuck]", 5, CancellationToken::new())
            .await
    });

    while !orchestrator.is_processing() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let history_before = orchestrator.history_len();

    let second = orchestrator
        .start_task("interloper [N:Stuck]", 5, CancellationToken::new())
        .await;
    assert!(!second);
    assert_eq!(orchestrator.history_len(), history_before);

    orchestrator.cancel_current_task();
    assert!(!first.await.unwrap());
}

#[tokio::test]
async fn cancel_mid_exchange_keeps_appended_history() {
    let talker = ScriptedAgent::new(
        "Talker",
        vec![Turn::SayThenHang(vec![ChatMessage::text(
            Role::Assistant,
            "Talker",
            "first and only",
        )])],
    );
    let hooks = Recorder::new();
    let orchestrator = Arc::new(initialized(vec![talker], hooks.clone()).await);

    let runner = Arc::clone(&orchestrator);
    let handle = tokio::spawn(async move {
        runner
            .start_task("go [N:Talker]", 5, CancellationToken::new())
            .await
    });

    // wait for the produced message to land, then cancel
    while orchestrator.history_len() < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    orchestrator.cancel_current_task();

    assert!(!handle.await.unwrap());
    assert!(!orchestrator.is_processing());
    // task injection + the message appended before cancellation survive
    assert_eq!(orchestrator.history_len(), 2);
    assert_eq!(hooks.completions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancel_is_idempotent_and_safe_when_idle() {
    let orchestrator = initialized(
        vec![ScriptedAgent::says("Alice", "hi")],
        Arc::new(NoopHooks),
    )
    .await;
    orchestrator.cancel_current_task();
    orchestrator.cancel_current_task();
    assert!(
        orchestrator
            .start_task("go [N:Alice]", 5, CancellationToken::new())
            .await
    );
    orchestrator.cancel_current_task();
}

#[tokio::test]
async fn export_import_round_trips_content_from_role() {
    let orchestrator = Orchestrator::new(config(), Arc::new(NoopHooks));
    orchestrator.append_message(ChatMessage::text(Role::System, "Director", "setup"));
    orchestrator.append_message(ChatMessage::text(Role::Assistant, "Alice", "line one"));
    orchestrator.append_message(ChatMessage::media("Bob", "clip://grunt.ogg"));

    let exported = orchestrator.export_history();
    orchestrator.clear_history();
    assert_eq!(orchestrator.history_len(), 0);

    orchestrator.import_history(exported);
    let restored = orchestrator.history();
    assert_eq!(restored.len(), 3);
    assert_eq!(restored[0].from(), "Director");
    assert_eq!(restored[0].text_content(), Some("setup"));
    assert_eq!(restored[1].from(), "Alice");
    assert_eq!(restored[1].text_content(), Some("line one"));
    // the media message comes back as canonical text carrying its uri
    assert_eq!(restored[2].from(), "Bob");
    assert_eq!(restored[2].text_content(), Some("clip://grunt.ogg"));
}

#[tokio::test]
async fn export_import_survives_json() {
    let orchestrator = Orchestrator::new(config(), Arc::new(NoopHooks));
    orchestrator.append_message(ChatMessage::text(Role::Assistant, "Alice", "persisted"));

    let json = serde_json::to_string(&orchestrator.export_history()).unwrap();
    orchestrator.clear_history();
    orchestrator.import_history(serde_json::from_str(&json).unwrap());

    assert_eq!(orchestrator.history_len(), 1);
    assert_eq!(orchestrator.history()[0].text_content(), Some("persisted"));
}

#[tokio::test]
async fn host_gate_delivers_through_the_run_loop() {
    let alice = ScriptedAgent::says("Alice", "through the gate");
    let (gate, mut host) = host_channel();
    let orchestrator = initialized(vec![alice], Arc::new(gate)).await;

    let host_loop = tokio::spawn(async move {
        let mut processed = Vec::new();
        while let Some(request) = host.requests.recv().await {
            processed.push(
                request
                    .message()
                    .text_content()
                    .unwrap_or("")
                    .to_string(),
            );
            request.complete(Ok(()));
        }
        let observed = host.observed.recv().await;
        let completed = host.completed.recv().await;
        (processed, observed, completed)
    });

    assert!(
        orchestrator
            .start_task("go [N:Alice]", 5, CancellationToken::new())
            .await
    );
    drop(orchestrator);

    let (processed, observed, completed) = host_loop.await.unwrap();
    assert_eq!(processed, vec!["through the gate"]);
    assert_eq!(
        observed,
        Some(("Alice".to_string(), "through the gate".to_string()))
    );
    assert_eq!(completed, Some(()));
}
