//! End-to-end handshake between an initiator and a receiver served over HTTP.

use axum::routing::post;
use axum::{Json, Router};
use iden3_agent_id::contracts::memory_registry::MemoryRegistry;
use iden3_agent_id::models::agent::AgentRecord;
use iden3_agent_id::models::did::generate_did;
use iden3_agent_id::services::handshake::{HandshakeInitiation, HandshakeService};
use iden3_agent_id::services::identity_service::IdentityService;
use iden3_agent_id::services::responder::HandshakeResponder;
use iden3_agent_id::wallet::key_management::KeyManager;
use iden3_agent_id::AgentIdError;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
async fn closed_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

struct Agent {
    key: KeyManager,
    did: String,
}

impl Agent {
    fn new() -> Self {
        let key = KeyManager::random();
        let did = generate_did(&key.address_hex(), "privado", "main").unwrap();
        Agent { key, did }
    }

    fn register(&self, registry: &MemoryRegistry, agent_id: u64, endpoint: &str) {
        registry.insert(
            self.key.address(),
            AgentRecord {
                did: self.did.clone(),
                agent_id,
                description: format!("agent {agent_id}"),
                service_endpoint: endpoint.to_string(),
            },
        );
    }
}

fn service(registry: Arc<MemoryRegistry>) -> HandshakeService<MemoryRegistry> {
    let identity = IdentityService::new(registry, Duration::ZERO, "privado", "main");
    HandshakeService::new(identity, reqwest::Client::new())
}

#[tokio::test]
async fn full_handshake_completes() {
    let responder = Arc::new(HandshakeResponder::new(32, 16));
    let receiver_addr = serve(Router::new().nest("/agent", responder.clone().routes())).await;

    let registry = Arc::new(MemoryRegistry::new());
    let initiator = Agent::new();
    let receiver = Agent::new();
    initiator.register(&registry, 1, "https://initiator.example/agent/");
    receiver.register(&registry, 2, &format!("http://{receiver_addr}/agent/"));

    let handshake = service(registry);
    let session = handshake
        .initiate(&HandshakeInitiation {
            initiator_did: &initiator.did,
            initiator_chain_id: 296,
            receiver_did: &receiver.did,
            receiver_chain_id: 296,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(session.challenge.len(), 32);
    assert_eq!(
        session.receiver_agent_callback_endpoint,
        format!("http://{receiver_addr}/agent/callback")
    );
    assert_eq!(responder.pending_sessions(), 1);

    let completed = handshake
        .complete(
            &initiator.key.private_key_hex(),
            &session.session_id,
            &session.receiver_agent_callback_endpoint,
            &session.challenge,
        )
        .await
        .unwrap();
    assert!(completed);
    assert_eq!(responder.pending_sessions(), 0);

    // The challenge was consumed.
    let replay = handshake
        .complete(
            &initiator.key.private_key_hex(),
            &session.session_id,
            &session.receiver_agent_callback_endpoint,
            &session.challenge,
        )
        .await
        .unwrap();
    assert!(!replay);
}

#[tokio::test]
async fn wrong_signer_is_not_completed() {
    let responder = Arc::new(HandshakeResponder::new(16, 16));
    let receiver_addr = serve(Router::new().nest("/agent", responder.routes())).await;

    let registry = Arc::new(MemoryRegistry::new());
    let initiator = Agent::new();
    let receiver = Agent::new();
    initiator.register(&registry, 1, "https://initiator.example/");
    receiver.register(&registry, 2, &format!("http://{receiver_addr}/agent"));

    let handshake = service(registry);
    let session = handshake
        .initiate(&HandshakeInitiation {
            initiator_did: &initiator.did,
            initiator_chain_id: 296,
            receiver_did: &receiver.did,
            receiver_chain_id: 296,
            ..Default::default()
        })
        .await
        .unwrap();

    let impostor = KeyManager::random().private_key_hex();
    let completed = handshake
        .complete(
            &impostor,
            &session.session_id,
            &session.receiver_agent_callback_endpoint,
            &session.challenge,
        )
        .await
        .unwrap();
    assert!(!completed);
}

#[tokio::test]
async fn unregistered_receiver_is_not_found() {
    let registry = Arc::new(MemoryRegistry::new());
    let initiator = Agent::new();
    initiator.register(&registry, 1, "https://initiator.example/");

    let err = service(registry)
        .initiate(&HandshakeInitiation {
            initiator_did: &initiator.did,
            initiator_chain_id: 296,
            receiver_did: &Agent::new().did,
            receiver_chain_id: 296,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AgentIdError::AgentNotFound(_)));
}

#[tokio::test]
async fn unreachable_receiver_fails_initiate() {
    let addr = closed_port().await;
    let registry = Arc::new(MemoryRegistry::new());
    let initiator = Agent::new();
    let receiver = Agent::new();
    initiator.register(&registry, 1, "https://initiator.example/");
    receiver.register(&registry, 2, &format!("http://{addr}/agent/"));

    let err = service(registry)
        .initiate(&HandshakeInitiation {
            initiator_did: &initiator.did,
            initiator_chain_id: 296,
            receiver_did: &receiver.did,
            receiver_chain_id: 296,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AgentIdError::Transport(_)));
}

#[tokio::test]
async fn receiver_without_challenge_is_unexpected() {
    let app = Router::new().route(
        "/agent/initiate",
        post(|| async { Json(json!({ "data": { "sessionId": "1" } })) }),
    );
    let addr = serve(app).await;

    let registry = Arc::new(MemoryRegistry::new());
    let initiator = Agent::new();
    let receiver = Agent::new();
    initiator.register(&registry, 1, "https://initiator.example/");
    receiver.register(&registry, 2, &format!("http://{addr}/agent/"));

    let err = service(registry)
        .initiate(&HandshakeInitiation {
            initiator_did: &initiator.did,
            initiator_chain_id: 296,
            receiver_did: &receiver.did,
            receiver_chain_id: 296,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AgentIdError::UnexpectedResponse(_)));
}

#[tokio::test]
async fn complete_only_accepts_matching_completion() {
    let app = Router::new()
        .route(
            "/ok",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "data": { "sessionId": body["sessionId"], "status": "handshake_completed" } }))
            }),
        )
        .route(
            "/other-session",
            post(|| async { Json(json!({ "data": { "sessionId": "other", "status": "handshake_completed" } })) }),
        )
        .route(
            "/wrong-status",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "data": { "sessionId": body["sessionId"], "status": "pending" } }))
            }),
        )
        .route("/bad-shape", post(|| async { Json(json!({ "ok": true })) }));
    let addr = serve(app).await;

    let handshake = service(Arc::new(MemoryRegistry::new()));
    let key = KeyManager::random().private_key_hex();

    let outcome = |path: &'static str| {
        let handshake = handshake.clone();
        let key = key.clone();
        async move {
            handshake
                .complete(&key, "1718000000000", &format!("http://{addr}{path}"), "abc")
                .await
                .unwrap()
        }
    };

    assert!(outcome("/ok").await);
    assert!(!outcome("/other-session").await);
    assert!(!outcome("/wrong-status").await);
    assert!(!outcome("/bad-shape").await);
    assert!(!outcome("/missing").await);
}

#[tokio::test]
async fn complete_against_closed_port_is_false() {
    let addr = closed_port().await;
    let key = KeyManager::random().private_key_hex();
    let completed = service(Arc::new(MemoryRegistry::new()))
        .complete(&key, "1", &format!("http://{addr}/agent/callback"), "abc")
        .await
        .unwrap();
    assert!(!completed);
}
