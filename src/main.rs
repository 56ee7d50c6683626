use std::process;

use hadith_reader::{
    AppError, ReaderContext,
    catalog::{Hadith, User},
    config::{self, Command},
    infra::telemetry,
    rpc::CallOptions,
    sidebar::Expansion,
};
use hadith_wire::messages::SearchRequest;
use serde::Serialize;
use serde_json::json;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    info!(
        context = ?settings.api.context,
        base = %settings.api.endpoints.base_for(settings.api.context),
        language = %cli_args.language,
        "hadith reader starting"
    );

    let ctx = ReaderContext::new(&settings, cli_args.language.clone())?;

    match cli_args.command {
        Command::Collections => print_json(&ctx.catalog.list_collections().await),
        Command::Collection { id } => {
            let detail = ctx
                .catalog
                .get_collection_with_books(&id)
                .await
                .ok_or_else(|| AppError::not_found(format!("collection `{id}`")))?;
            print_json(&detail)
        }
        Command::Navigation { expand } => run_navigation(&ctx, &expand).await,
        Command::Hadith { urn } => {
            let hadith = ctx
                .client
                .get_hadith(&urn, ctx.language())
                .await?
                .hadith
                .ok_or_else(|| AppError::not_found(format!("hadith `{urn}`")))?;
            print_json(&Hadith::from(hadith))
        }
        Command::Search { query, limit } => {
            let request = SearchRequest {
                query,
                language: ctx.language().to_string(),
                limit,
                ..Default::default()
            };
            let response = ctx.client.search(&request).await?;
            let hadiths: Vec<Hadith> = response.hadiths.into_iter().map(Hadith::from).collect();
            print_json(&json!({ "total": response.total, "hadiths": hadiths }))
        }
        Command::Login { username, password } => {
            let auth = ctx.client.login(&username, &password).await?;
            ctx.session.set(auth.token);

            let reply = ctx.client.current_user(CallOptions::default()).await?;
            let user = reply
                .value
                .user
                .or(auth.user)
                .map(User::from)
                .ok_or_else(|| AppError::unexpected("login succeeded without a user"))?;
            print_json(&json!({
                "user": user,
                "expires_at": auth.expires_at,
                "authenticated": !reply.auth.is_missing(),
            }))
        }
    }
}

async fn run_navigation(ctx: &ReaderContext, expand: &[String]) -> Result<(), AppError> {
    let navigation = ctx.catalog.list_collections_with_preloaded_books().await;
    let sidebar = ctx.sidebar();
    sidebar.seed_navigation(&navigation);

    for id in expand {
        let Some(entry) = navigation.iter().find(|entry| &entry.collection.id == id) else {
            warn!(collection = %id, "cannot expand unknown collection");
            continue;
        };
        if let Expansion::Failed(err) = sidebar.expand_collection(&entry.collection).await {
            warn!(collection = %id, error = %err, "expansion failed");
        }
    }

    let tree: Vec<_> = navigation
        .iter()
        .map(|entry| {
            let id = &entry.collection.id;
            json!({
                "collection": entry.collection,
                "expanded": sidebar.is_expanded(id),
                "books": sidebar.children(id).map(|books| books.to_vec()),
            })
        })
        .collect();
    print_json(&tree)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
