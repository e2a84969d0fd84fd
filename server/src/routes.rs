use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use ticketing_client::{NewEvent, PermissionGrant, TicketingApi};

use crate::error::ApiError;
use crate::service::Mirror;

type Shared<A> = web::Data<Mirror<A>>;

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    pub owner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub address: String,
}

fn parse_address(raw: &str) -> Result<Pubkey, ApiError> {
    Pubkey::from_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid address {raw}")))
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Mounts the JSON API under `/api`.
pub fn configure<A: TicketingApi + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(health::<A>))
            .route("/events", web::get().to(list_events::<A>))
            .route("/events", web::post().to(create_event::<A>))
            .route("/events/{id}", web::get().to(get_event::<A>))
            .route("/events/{id}/purchase", web::post().to(purchase::<A>))
            .route("/events/{id}/sales", web::get().to(sales::<A>))
            .route("/tickets", web::get().to(list_tickets::<A>))
            .route("/tickets/{id}", web::get().to(get_ticket::<A>))
            .route("/tickets/{id}/transfer", web::post().to(transfer::<A>))
            .route("/tickets/{id}/prove", web::post().to(prove::<A>))
            .route("/tickets/{id}/price", web::get().to(price::<A>))
            .route("/tickets/{id}/resale-quote", web::get().to(resale_quote::<A>))
            .route("/permissions", web::post().to(set_permission::<A>))
            .route("/wallet/connect", web::post().to(connect_wallet::<A>))
            .route("/wallet/{address}/balance", web::get().to(balance::<A>)),
    );
}

async fn health<A: TicketingApi>(mirror: Shared<A>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "wallet": mirror.api().wallet().to_string(),
    }))
}

async fn list_events<A: TicketingApi>(mirror: Shared<A>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(mirror.list_events().await?))
}

async fn create_event<A: TicketingApi>(
    mirror: Shared<A>,
    body: web::Json<NewEvent>,
) -> Result<HttpResponse, ApiError> {
    let event = mirror.create_event(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(event))
}

async fn get_event<A: TicketingApi>(
    mirror: Shared<A>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(mirror.event(path.into_inner()).await?))
}

async fn purchase<A: TicketingApi>(
    mirror: Shared<A>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let ticket = mirror.purchase(path.into_inner()).await?;
    Ok(HttpResponse::Created().json(ticket))
}

async fn sales<A: TicketingApi>(
    mirror: Shared<A>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let event_id = path.into_inner();
    let sold = mirror.sales_count(event_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "event_id": event_id, "tickets_sold": sold })))
}

async fn list_tickets<A: TicketingApi>(
    mirror: Shared<A>,
    query: web::Query<TicketQuery>,
) -> Result<HttpResponse, ApiError> {
    let owner = query.owner.as_deref().map(parse_address).transpose()?;
    Ok(HttpResponse::Ok().json(mirror.list_tickets(owner).await?))
}

async fn get_ticket<A: TicketingApi>(
    mirror: Shared<A>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(mirror.ticket(path.into_inner()).await?))
}

async fn transfer<A: TicketingApi>(
    mirror: Shared<A>,
    path: web::Path<u64>,
    body: web::Json<TransferRequest>,
) -> Result<HttpResponse, ApiError> {
    let to = parse_address(&body.to)?;
    Ok(HttpResponse::Ok().json(mirror.transfer(path.into_inner(), to).await?))
}

async fn prove<A: TicketingApi>(
    mirror: Shared<A>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let ticket_id = path.into_inner();
    let verified = mirror.prove(ticket_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "ticket_id": ticket_id, "verified": verified })))
}

async fn price<A: TicketingApi>(
    mirror: Shared<A>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let ticket_id = path.into_inner();
    let price = mirror.price(ticket_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "ticket_id": ticket_id, "price": price })))
}

async fn resale_quote<A: TicketingApi>(
    mirror: Shared<A>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let ticket_id = path.into_inner();
    let quote = mirror.resale_quote(ticket_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "ticket_id": ticket_id, "resale_price": quote })))
}

async fn set_permission<A: TicketingApi>(
    mirror: Shared<A>,
    body: web::Json<PermissionGrant>,
) -> Result<HttpResponse, ApiError> {
    mirror.set_permission(body.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn connect_wallet<A: TicketingApi>(
    mirror: Shared<A>,
    body: web::Json<ConnectRequest>,
) -> Result<HttpResponse, ApiError> {
    let address = parse_address(&body.address)?;
    Ok(HttpResponse::Ok().json(mirror.connect_wallet(address, unix_now()).await?))
}

async fn balance<A: TicketingApi>(
    mirror: Shared<A>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let address = parse_address(&path)?;
    let lamports = mirror.balance(address).await?;
    Ok(HttpResponse::Ok().json(json!({ "address": address.to_string(), "lamports": lamports })))
}
