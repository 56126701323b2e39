//! Thin axum surface over [`crate::commands::World`]: one route per command,
//! none of which does anything the corresponding `World` method doesn't
//! already do. State is injected via `Extension<Arc<ServerContext>>`,
//! requests pass through `middleware::from_fn(log_requests)`, and CORS is
//! permissive for a browser frontend.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::commands::World;
use crate::scheduler::SystemClock;

use super::dto::*;
use super::error::ApiError;
use super::logging::log_requests;
use super::stream;

pub type AppState = Arc<World<SystemClock>>;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/tables", get(list_tables))
        .route("/tables/:table_id", get(observe_table))
        .route("/tables/:table_id/me", get(observe_table_as))
        .route("/tables/:table_id/join", post(join_table))
        .route("/tables/:table_id/leave", post(leave_table))
        .route("/tables/:table_id/start-hand", post(start_hand))
        .route("/tables/:table_id/act", post(act))
        .route("/tables/:table_id/feed", get(stream::table_feed))
        .route("/duels/feed", get(stream::duel_feed))
        .route("/agents/feed", get(stream::private_feed))
        .route("/duels/coinflip", post(coinflip_create))
        .route("/duels/rps", post(rps_create))
        .route("/duels/open", get(duel_open_list))
        .route("/duels/history", get(duel_history))
        .route("/duels/:duel_id", get(duel_get))
        .route("/duels/:duel_id/accept", post(duel_accept))
        .route("/duels/:duel_id/cancel", post(duel_cancel))
        .route("/duels/:duel_id/commit", post(rps_commit))
        .route("/duels/:duel_id/reveal", post(rps_reveal))
        .route("/wallet/deposit", post(deposit))
        .route("/wallet/withdraw", post(withdraw))
        .route("/wallet/transactions", get(transactions))
        .route("/audit", get(audit))
        .with_state(state)
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
}

async fn list_tables(State(state): State<AppState>) -> Json<Vec<crate::table::view::PublicTableView>> {
    Json(state.list_tables())
}

async fn observe_table(
    State(state): State<AppState>,
    Path(table_id): Path<String>,
) -> Result<Json<crate::table::view::PublicTableView>, ApiError> {
    Ok(Json(state.observe(&table_id)?))
}

async fn observe_table_as(
    State(state): State<AppState>,
    Path(table_id): Path<String>,
    Query(query): Query<AgentQuery>,
) -> Result<Json<crate::table::view::PrivateTableView>, ApiError> {
    let agent = query.agent.ok_or_else(|| ApiError::bad_request("agent query parameter is required"))?;
    Ok(Json(state.observe_as(&table_id, &agent)?))
}

async fn join_table(
    State(state): State<AppState>,
    Path(table_id): Path<String>,
    Json(body): Json<JoinRequest>,
) -> Result<Json<crate::table::view::PublicTableView>, ApiError> {
    Ok(Json(state.join(&table_id, body.agent, body.display_name, body.buy_in)?))
}

async fn leave_table(
    State(state): State<AppState>,
    Path(table_id): Path<String>,
    Json(body): Json<LeaveBody>,
) -> Result<(), ApiError> {
    state.leave(&table_id, &body.agent)?;
    Ok(())
}

/// Admin/test only.
async fn start_hand(State(state): State<AppState>, Path(table_id): Path<String>) -> Result<(), ApiError> {
    state.start_hand(&table_id)?;
    Ok(())
}

async fn act(
    State(state): State<AppState>,
    Path(table_id): Path<String>,
    Json(body): Json<ActBody>,
) -> Result<(), ApiError> {
    state.act(&table_id, &body.agent, body.action.into())?;
    Ok(())
}

async fn coinflip_create(State(state): State<AppState>, Json(body): Json<CoinflipCreateRequest>) -> Result<Json<Uuid>, ApiError> {
    Ok(Json(state.coinflip_create(body.agent, body.stake, body.currency)?))
}

async fn rps_create(State(state): State<AppState>, Json(body): Json<RpsCreateRequest>) -> Result<Json<Uuid>, ApiError> {
    Ok(Json(state.rps_create(body.agent, body.stake, body.rounds, body.currency)?))
}

async fn duel_accept(
    State(state): State<AppState>,
    Path(duel_id): Path<Uuid>,
    Json(body): Json<DuelIdBody>,
) -> Result<(), ApiError> {
    state.duel_accept(duel_id, body.agent)?;
    Ok(())
}

async fn duel_cancel(
    State(state): State<AppState>,
    Path(duel_id): Path<Uuid>,
    Json(body): Json<DuelIdBody>,
) -> Result<(), ApiError> {
    state.duel_cancel(duel_id, &body.agent)?;
    Ok(())
}

async fn rps_commit(
    State(state): State<AppState>,
    Path(duel_id): Path<Uuid>,
    Json(body): Json<CommitRequest>,
) -> Result<(), ApiError> {
    state.rps_commit(duel_id, &body.agent, body.hash)?;
    Ok(())
}

async fn rps_reveal(
    State(state): State<AppState>,
    Path(duel_id): Path<Uuid>,
    Json(body): Json<RevealRequest>,
) -> Result<(), ApiError> {
    state.rps_reveal(duel_id, &body.agent, body.choice, &body.nonce)?;
    Ok(())
}

async fn duel_get(State(state): State<AppState>, Path(duel_id): Path<Uuid>) -> Result<Json<DuelView>, ApiError> {
    Ok(Json(state.duel_get(duel_id)?.into()))
}

async fn duel_open_list(State(state): State<AppState>, Query(query): Query<OpenListQuery>) -> Json<Vec<DuelView>> {
    Json(state.duel_open_list(query.kind).into_iter().map(DuelView::from).collect())
}

async fn duel_history(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> Json<Vec<DuelView>> {
    let limit = query.limit.unwrap_or(20);
    Json(state.duel_history(query.kind, &query.agent, limit).into_iter().map(DuelView::from).collect())
}

async fn deposit(State(state): State<AppState>, Json(body): Json<DepositRequest>) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.deposit(body.agent, body.currency, body.amount)?;
    Ok(Json(BalanceResponse { balance }))
}

async fn withdraw(State(state): State<AppState>, Json(body): Json<WithdrawRequest>) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.withdraw(body.agent, body.currency, body.amount, body.destination)?;
    Ok(Json(BalanceResponse { balance }))
}

async fn transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Json<Vec<crate::ledger::Transaction>> {
    Json(state.transactions_for(&query.agent))
}

async fn audit(State(state): State<AppState>, Query(query): Query<AuditQuery>) -> Json<AuditResponse> {
    let report = state.audit(query.currency);
    Json(AuditResponse {
        currency: query.currency,
        deposits: report.deposits,
        withdrawals: report.withdrawals,
        wallets: report.wallets,
        table_chips: report.table_chips,
        duel_escrows: report.duel_escrows,
        rake: report.rake,
        residual: report.residual(),
        holds: report.holds(),
    })
}
