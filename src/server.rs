use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{delete, get, post},
    Json, Router,
};
use std::{
    collections::HashSet,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::info;

use crate::api::{
    ActorRequest, ClaimSubmitRequest, ClearWithdrawalRequest, CommentRequest, CreatePostRequest,
    CreateUserRequest, EventEnvelope, FeedQuery, RetractRequest, WithdrawalRequest,
};
use engagement_sim::clock::SystemClock;
use engagement_sim::config::EngineConfig;
use engagement_sim::engine::{AnalyticsSummary, Engine, EngineError, SessionSnapshot};
use engagement_sim::feed::{sort_posts, SortOrder};
use engagement_sim::store::DocumentStore;
use engagement_sim::tasks::spawn_background_tasks;
use engagement_sim::{Comment, Post, User, Withdrawal};
use engagement_sim::copyright::CopyrightClaim;

#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
}

pub async fn serve(args: crate::ServeArgs) -> Result<(), String> {
    let (mut config, config_path) = EngineConfig::load(args.config.clone())?;
    if let Some(path) = config_path.as_ref() {
        if path.exists() {
            info!(config = %path.display(), "loaded engine config");
        }
    }
    if let Some(data_dir) = args.data_dir.clone() {
        config.store.data_dir = data_dir;
    }

    let store = Arc::new(DocumentStore::open(config.store.data_dir.clone()).await?);
    let engine = Arc::new(Engine::new(store, config, Arc::new(SystemClock)));
    let _background = spawn_background_tasks(engine.clone());

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/feed", get(feed_handler))
        .route("/api/users", post(create_user))
        .route("/api/users/:user_id/session", post(session_load))
        .route("/api/users/:user_id/analytics", get(analytics))
        .route("/api/users/:user_id/follow", post(follow_user))
        .route("/api/posts", post(create_post))
        .route("/api/posts/:post_id", delete(delete_post))
        .route("/api/posts/:post_id/like", post(like_post))
        .route("/api/posts/:post_id/view", post(view_post))
        .route("/api/posts/:post_id/comments", post(add_comment))
        .route(
            "/api/posts/:post_id/comments/:comment_id",
            delete(delete_comment),
        )
        .route("/api/withdrawals", post(request_withdrawal))
        .route("/api/withdrawals/clear", post(clear_withdrawal))
        .route("/api/claims", post(submit_claim))
        .route("/api/claims/pending", get(pending_claims))
        .route("/api/claims/:claim_id/approve", post(approve_claim))
        .route("/api/claims/:claim_id/reject", post(reject_claim))
        .route("/api/claims/:claim_id/retract", post(retract_claim))
        .route("/api/events", get(events_handler))
        .with_state(AppState { engine });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;
    info!(%addr, "engagement engine listening");

    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| format!("failed to bind server: {}", err))?,
        app,
    )
    .await
    .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

fn error_reply(err: EngineError) -> (StatusCode, String) {
    let status = match &err {
        EngineError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        EngineError::AccountLocked | EngineError::NotAuthor | EngineError::NotClaimant => {
            StatusCode::FORBIDDEN
        }
        EngineError::UnknownUser(_) | EngineError::PostMissing => StatusCode::NOT_FOUND,
        EngineError::NotEligible { .. }
        | EngineError::NotMonetized
        | EngineError::BelowMinimumWithdrawal { .. }
        | EngineError::InsufficientBalance { .. }
        | EngineError::RedeemCodeRequired => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::InvalidTransition { .. } => StatusCode::CONFLICT,
        EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn feed_handler(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<Post>>, (StatusCode, String)> {
    let order = match query.sort.as_deref() {
        None => SortOrder::Feed,
        Some(value) => SortOrder::from_str(value)
            .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("invalid sort: {}", value)))?,
    };
    let viewed: HashSet<String> = query
        .viewed
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    let mut posts = state.engine.store().list_posts().await;
    sort_posts(&mut posts, order, &viewed);
    Ok(Json(posts))
}

async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<User>, (StatusCode, String)> {
    if request.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".to_string()));
    }
    let user = state
        .engine
        .create_user(request.name.trim())
        .await
        .map_err(error_reply)?;
    Ok(Json(user))
}

async fn session_load(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    let snapshot = state
        .engine
        .session_load(&user_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(snapshot))
}

async fn analytics(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<AnalyticsSummary>, (StatusCode, String)> {
    let summary = state.engine.analytics(&user_id).await.map_err(error_reply)?;
    Ok(Json(summary))
}

async fn follow_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<Option<bool>>, (StatusCode, String)> {
    let followed = state
        .engine
        .follow_user(&request.user_id, &user_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(followed))
}

async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<Post>, (StatusCode, String)> {
    if request.content.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "content is required".to_string()));
    }
    let media = request
        .media_kind()
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?;
    let post = state
        .engine
        .create_post(
            &request.user_id,
            request.content.trim(),
            media,
            request.media_url.clone(),
        )
        .await
        .map_err(error_reply)?;
    Ok(Json(post))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<bool>, (StatusCode, String)> {
    let removed = state
        .engine
        .delete_post(&request.user_id, &post_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(removed))
}

async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<Option<bool>>, (StatusCode, String)> {
    let liked = state
        .engine
        .like_post(&request.user_id, &post_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(liked))
}

async fn view_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .engine
        .view_post(&request.user_id, &post_id)
        .await
        .map_err(error_reply)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<Option<Comment>>, (StatusCode, String)> {
    if request.text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "text is required".to_string()));
    }
    let comment = state
        .engine
        .add_comment(&request.user_id, &post_id, request.text.trim())
        .await
        .map_err(error_reply)?;
    Ok(Json(comment))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(String, String)>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<bool>, (StatusCode, String)> {
    let removed = state
        .engine
        .delete_comment(&request.user_id, &post_id, &comment_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(removed))
}

async fn request_withdrawal(
    State(state): State<AppState>,
    Json(request): Json<WithdrawalRequest>,
) -> Result<Json<Withdrawal>, (StatusCode, String)> {
    let withdrawal = state
        .engine
        .request_withdrawal(&request.user_id, request.amount)
        .await
        .map_err(error_reply)?;
    Ok(Json(withdrawal))
}

async fn clear_withdrawal(
    State(state): State<AppState>,
    Json(request): Json<ClearWithdrawalRequest>,
) -> Result<Json<bool>, (StatusCode, String)> {
    let cleared = state
        .engine
        .clear_withdrawal(
            &request.user_id,
            &request.withdrawal_id,
            &request.redeem_code,
        )
        .await
        .map_err(error_reply)?;
    Ok(Json(cleared))
}

async fn submit_claim(
    State(state): State<AppState>,
    Json(request): Json<ClaimSubmitRequest>,
) -> Result<Json<Option<CopyrightClaim>>, (StatusCode, String)> {
    let action = request
        .claim_action()
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?;
    let claim = state
        .engine
        .submit_claim(
            &request.claimant_id,
            &request.post_id,
            action,
            &request.original_content_url,
        )
        .await
        .map_err(error_reply)?;
    Ok(Json(claim))
}

async fn pending_claims(
    State(state): State<AppState>,
) -> Result<Json<Vec<CopyrightClaim>>, (StatusCode, String)> {
    Ok(Json(state.engine.pending_claims().await))
}

async fn approve_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
) -> Result<Json<bool>, (StatusCode, String)> {
    let approved = state
        .engine
        .approve_claim(&claim_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(approved))
}

async fn reject_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
) -> Result<Json<bool>, (StatusCode, String)> {
    let rejected = state
        .engine
        .reject_claim(&claim_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(rejected))
}

async fn retract_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
    Json(request): Json<RetractRequest>,
) -> Result<Json<bool>, (StatusCode, String)> {
    let retracted = state
        .engine
        .retract_claim(&request.claimant_id, &claim_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(retracted))
}

async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let receiver = state.engine.store().subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|event| match event {
        Ok(event) => {
            let envelope = EventEnvelope {
                scope: event.scope,
                id: event.id,
                op: event.op,
                timestamp_ms: now_ms(),
            };
            let data = serde_json::to_string(&envelope).unwrap_or_default();
            Some(Ok(Event::default().data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(8)))
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}
