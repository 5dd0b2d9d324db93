use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::auth::Actor;
use crate::error::{Result, SplitError};
use crate::ledger::Ledger;
use crate::schemas::ExpenseDraft;
use crate::store::Store;

#[derive(Deserialize, Serialize)]
pub struct GroupNameJson {
    pub name: String,
}

#[derive(Deserialize, Serialize)]
pub struct JoinCodeJson {
    pub code: String,
}

#[derive(Deserialize, Serialize)]
pub struct ErrorJson {
    pub error: String,
}

pub fn configure<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/groups")
            .route("", web::post().to(add_group::<S>))
            .route("", web::get().to(list_groups::<S>))
            .route("/join", web::post().to(join_group::<S>))
            .route("/{id}", web::get().to(get_group::<S>))
            .route("/{id}/leave", web::post().to(leave_group::<S>))
            .route("/{id}/members", web::get().to(get_members::<S>))
            .route("/{id}/balance", web::get().to(get_balance::<S>))
            .route("/{id}/balance/{user}", web::get().to(get_member_balance::<S>))
            .route("/{id}/debts", web::get().to(get_debts::<S>))
            .route("/{id}/expenses", web::get().to(list_expenses::<S>))
            .route("/{id}/expenses", web::post().to(add_expense::<S>)),
    )
    .service(
        web::scope("/expenses")
            .route("/{id}", web::get().to(get_expense::<S>))
            .route("/{id}", web::put().to(update_expense::<S>))
            .route("/{id}", web::delete().to(delete_expense::<S>))
            .route(
                "/{id}/participants/{user}",
                web::delete().to(remove_participant::<S>),
            ),
    )
    .service(
        web::scope("/shares").route("/{id}/toggle", web::post().to(toggle_payment::<S>)),
    );
}

fn failure(err: SplitError) -> HttpResponse {
    let body = ErrorJson {
        error: err.to_string(),
    };
    match err {
        SplitError::NotFound(_) => HttpResponse::NotFound().json(body),
        SplitError::PermissionDenied(_) => HttpResponse::Forbidden().json(body),
        SplitError::InvalidState(_) => HttpResponse::UnprocessableEntity().json(body),
        SplitError::Store(_) => {
            error!("{}", body.error);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn respond<T: Serialize>(result: Result<T>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(err) => failure(err),
    }
}

async fn add_group<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    json: web::Json<GroupNameJson>,
) -> HttpResponse {
    match ledger.create_group(actor.nick(), &json.into_inner().name).await {
        Ok(group) => HttpResponse::Created().json(group),
        Err(err) => failure(err),
    }
}

async fn list_groups<S: Store>(ledger: web::Data<Ledger<S>>, actor: Actor) -> HttpResponse {
    respond(ledger.groups_for(actor.nick()).await)
}

async fn join_group<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    json: web::Json<JoinCodeJson>,
) -> HttpResponse {
    respond(ledger.join_group(actor.nick(), &json.into_inner().code).await)
}

async fn get_group<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    id: web::Path<String>,
) -> HttpResponse {
    respond(ledger.group(actor.nick(), &id.into_inner()).await)
}

async fn leave_group<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    id: web::Path<String>,
) -> HttpResponse {
    respond(ledger.leave_group(actor.nick(), &id.into_inner()).await)
}

async fn get_members<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    id: web::Path<String>,
) -> HttpResponse {
    respond(ledger.members(actor.nick(), &id.into_inner()).await)
}

async fn get_balance<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    id: web::Path<String>,
) -> HttpResponse {
    respond(ledger.balances(actor.nick(), &id.into_inner()).await)
}

async fn get_member_balance<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (id, user) = path.into_inner();
    respond(ledger.balance(actor.nick(), &id, &user).await)
}

async fn get_debts<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    id: web::Path<String>,
) -> HttpResponse {
    respond(ledger.debts(actor.nick(), &id.into_inner()).await)
}

async fn list_expenses<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    id: web::Path<String>,
) -> HttpResponse {
    respond(ledger.expenses(actor.nick(), &id.into_inner()).await)
}

async fn add_expense<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    id: web::Path<String>,
    expense: web::Json<ExpenseDraft>,
) -> HttpResponse {
    match ledger
        .add_expense(actor.nick(), &id.into_inner(), expense.into_inner())
        .await
    {
        Ok(expense) => HttpResponse::Created().json(expense),
        Err(err) => failure(err),
    }
}

async fn get_expense<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    id: web::Path<String>,
) -> HttpResponse {
    respond(ledger.expense(actor.nick(), &id.into_inner()).await)
}

async fn update_expense<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    id: web::Path<String>,
    expense: web::Json<ExpenseDraft>,
) -> HttpResponse {
    respond(
        ledger
            .update_expense(actor.nick(), &id.into_inner(), expense.into_inner())
            .await,
    )
}

async fn delete_expense<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    id: web::Path<String>,
) -> HttpResponse {
    match ledger.delete_expense(actor.nick(), &id.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => failure(err),
    }
}

async fn remove_participant<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (id, user) = path.into_inner();
    respond(ledger.remove_participant(actor.nick(), &id, &user).await)
}

async fn toggle_payment<S: Store>(
    ledger: web::Data<Ledger<S>>,
    actor: Actor,
    id: web::Path<String>,
) -> HttpResponse {
    respond(ledger.toggle_payment(actor.nick(), &id.into_inner()).await)
}
