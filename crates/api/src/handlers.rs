//! Request handlers.

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::models::{
    PairAddressQuery, PairQuery, PlanActionRequest, PlanResponse, PoolEntry, QuoteQuery,
    QuoteResponse, ResolveActionRequest, ResolveActionResponse, SwapHistoryQuery,
};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use nlswap_data::{DEFAULT_HISTORY_DAYS, MAX_HISTORY_DAYS, SwapHistory, load_swap_history};
use nlswap_domain::PoolSnapshot;
use nlswap_domain::math::constant_product::BPS;
use nlswap_domain::token::format_units;
use nlswap_execution::gather_account_context;
use nlswap_protocols::PairData;
use nlswap_resolver::{CompletionOverrides, ResolveError};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// `POST /resolve-action`
pub async fn resolve_action(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResolveActionRequest>,
) -> Result<Json<ResolveActionResponse>, ApiError> {
    let input = request
        .input
        .filter(|i| !i.trim().is_empty())
        .ok_or(ResolveError::MissingInput)?;
    let pool: PoolSnapshot = request
        .pool
        .ok_or(ResolveError::MissingPoolContext)?
        .into();

    let overrides = CompletionOverrides {
        api_key: request.api_key.map(Zeroizing::new),
        custom_endpoint: request.custom_endpoint,
    };
    let resolver = state.resolver(&overrides).map_err(ResolveError::from)?;
    let action = resolver.resolve(&input, &pool).await?;

    Ok(Json(ResolveActionResponse {
        success: true,
        description: action.to_string(),
        action,
    }))
}

/// `GET /pair-address`
///
/// With `index`, answers from the configured known pairs (`null` past the end).
/// Otherwise asks the factory for the pair of `token0` and `token1`; `factory`
/// defaults to the configured one.
pub async fn pair_address(
    State(state): State<AppState>,
    Query(query): Query<PairAddressQuery>,
) -> Result<Json<Value>, ApiError> {
    if let Some(raw) = query.index {
        let index: usize = raw
            .trim()
            .parse()
            .map_err(|_| ApiError::bad_request("Invalid index parameter"))?;
        let pair = state.catalog.known_pair(index);
        debug!(index, pair = ?pair, "Known pair lookup");
        return Ok(Json(json!(pair)));
    }

    let factory = query
        .factory
        .or_else(|| state.catalog.config().factory_address.clone());
    match (factory, query.token0, query.token1) {
        (Some(factory), Some(token0), Some(token1)) => {
            let pair = state
                .catalog
                .pair_reader()
                .find_pair(&factory, &token0, &token1)
                .await
                .map_err(ApiError::ledger("Failed to get pool address"))?;
            Ok(Json(json!({ "pairAddress": pair })))
        }
        _ => Err(ApiError::bad_request(
            "Missing required parameters. Need either index or (factory, token0, token1)",
        )),
    }
}

/// `GET /pair-data`
///
/// Reads the pair from the ledger and refreshes its catalog entry.
pub async fn pair_data(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> Result<Json<PairData>, ApiError> {
    let pair = required(query.pair, "Missing required parameters")?;
    let data = state
        .catalog
        .pair_reader()
        .pair_data(&pair)
        .await
        .map_err(ApiError::ledger("Failed to retrieve pool details"))?;
    state.catalog.insert(data.clone().into_snapshot()).await;
    Ok(Json(data))
}

/// `GET /swap-history`
pub async fn swap_history(
    State(state): State<AppState>,
    Query(query): Query<SwapHistoryQuery>,
) -> Result<Json<SwapHistory>, ApiError> {
    let pair = required(query.pair, "Missing pair address")?;
    let days = match query.days {
        None => DEFAULT_HISTORY_DAYS,
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|d| (1..=MAX_HISTORY_DAYS).contains(d))
            .ok_or_else(|| {
                ApiError::bad_request(format!(
                    "Invalid days parameter: expected 1 to {MAX_HISTORY_DAYS}"
                ))
            })?,
    };

    let pool = state
        .catalog
        .get_or_load(&pair)
        .await
        .map_err(ApiError::ledger("Failed to fetch swap history"))?;
    let history = load_swap_history(
        state.swap_logs.as_ref(),
        &pair,
        pool.decimals0,
        pool.decimals1,
        days,
        Utc::now(),
    )
    .await
    .map_err(ApiError::ledger("Failed to fetch swap history"))?;
    Ok(Json(history))
}

/// `GET /quote`
pub async fn quote(
    State(state): State<AppState>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let pair = required(query.pair, "Missing pair address")?;
    let from = required(query.from, "Missing input token")?;
    let raw_amount = required(query.amount, "Missing amount")?;
    let amount = Decimal::from_str(raw_amount.trim())
        .ok()
        .filter(|a| a.is_sign_positive() && !a.is_zero())
        .ok_or_else(|| ApiError::bad_request(format!("Invalid amount: {raw_amount}")))?;

    let pool = state
        .catalog
        .get_or_load(&pair)
        .await
        .map_err(ApiError::ledger("Failed to retrieve pool details"))?;
    let quote = state.executor.quote(&pool, &from, amount)?;
    let side_out = quote.side_in.other();
    info!(pair = %pool.address, from = %from, amount = %amount, expected_out = %quote.expected_out, "Quoted swap");
    Ok(Json(QuoteResponse {
        pair: pool.address.clone(),
        from_token: pool.symbol(quote.side_in).to_string(),
        to_token: pool.symbol(side_out).to_string(),
        amount_in: quote.amount_in,
        expected_out: quote.expected_out,
        min_out: quote.min_out,
        expected_out_formatted: format_units(quote.expected_out, pool.decimals(side_out)),
        spot_price: quote.spot_price,
        price_impact_bps: quote.price_impact_bps,
        slippage_bps: state.executor.config().slippage_bps,
    }))
}

/// `GET /pools`
pub async fn list_pools(State(state): State<AppState>) -> Json<Vec<PoolEntry>> {
    let pools = state
        .catalog
        .list()
        .await
        .into_iter()
        .map(|pool| PoolEntry {
            pair_label: pool.pair_label(),
            pool: PoolSnapshot::clone(&pool),
        })
        .collect();
    Json(pools)
}

/// `POST /plan-action`
///
/// Reads the user's allowances and LP position and returns the calls to sign.
pub async fn plan_action(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PlanActionRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    let executor = match request.slippage_bps {
        Some(bps) if bps > BPS => {
            return Err(ApiError::bad_request(format!(
                "Invalid slippageBps: must be at most {BPS}"
            )));
        }
        Some(bps) => state.executor.with_slippage_bps(bps),
        None => state.executor.clone(),
    };

    let pool = state
        .catalog
        .get_or_load(&request.pair)
        .await
        .map_err(ApiError::ledger("Failed to retrieve pool details"))?;
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    let account = gather_account_context(
        state.reader.as_ref(),
        &pool,
        &request.user_address,
        &executor.config().router_address,
        now,
    )
    .await
    .map_err(ApiError::ledger("Failed to read account state"))?;

    let plan = executor.plan(&request.action, pool, &account)?;
    info!(plan_id = %plan.id, kind = %plan.kind, calls = plan.call_count(), "Planned action");
    Ok(Json(PlanResponse::try_from(&plan)?))
}

fn required(value: Option<String>, message: &'static str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}
