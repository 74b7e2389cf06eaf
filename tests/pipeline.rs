use axum::{
    extract::{Path as AxumPath, Query},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use cinenote::model::MediaKind;
use cinenote::note::{FsVault, NoteGenerator};
use cinenote::provider::{Endpoints, MetadataClient};
use cinenote::settings::Settings;
use cinenote::shell::create_from_query;
use cinenote::Error;

const API_KEY: &str = "test-key";
const RATINGS_KEY: &str = "ratings-key";

type Params = Query<HashMap<String, String>>;

fn authorized(params: &HashMap<String, String>) -> Result<(), StatusCode> {
    if params.get("api_key").map(String::as_str) == Some(API_KEY) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn search_multi(Query(params): Params) -> Result<Json<Value>, StatusCode> {
    authorized(&params)?;
    Ok(Json(json!({
        "results": [
            {"media_type": "movie", "id": 27205, "title": "Inception",
             "release_date": "2010-07-15", "poster_path": "/inception.jpg"},
            {"media_type": "person", "id": 525, "name": "Christopher Nolan"},
            {"media_type": "tv", "id": 1396, "name": "Breaking Bad",
             "first_air_date": "2008-01-20", "poster_path": null},
            {"media_type": "movie", "id": 603, "title": "The Matrix",
             "release_date": "1999-03-31"},
            {"media_type": "movie", "id": 1, "title": "Untitled Project", "release_date": ""}
        ]
    })))
}

async fn movie_detail(AxumPath(id): AxumPath<u64>, Query(params): Params) -> Result<Json<Value>, StatusCode> {
    authorized(&params)?;
    if params.get("append_to_response").map(String::as_str) != Some("external_ids,credits") {
        return Err(StatusCode::BAD_REQUEST);
    }
    match id {
        27205 => Ok(Json(json!({
            "id": 27205,
            "title": "Inception",
            "genres": [{"name": "Action"}, {"name": "Sci-Fi"}],
            "release_date": "2010-07-15",
            "runtime": 148,
            "overview": "A thief who steals \"corporate secrets\" through dreams.",
            "poster_path": "/inception.jpg",
            "original_language": "en",
            "production_countries": [
                {"name": "United Kingdom"},
                {"name": "United States of America"}
            ],
            "external_ids": {"imdb_id": "tt1375666"},
            "credits": {
                "cast": [
                    {"name": "Leonardo DiCaprio"},
                    {"name": "Joseph Gordon-Levitt"},
                    {"name": "Elliot Page"},
                    {"name": "Tom Hardy"},
                    {"name": "Ken Watanabe"},
                    {"name": "Cillian Murphy"}
                ],
                "crew": [
                    {"name": "Hans Zimmer", "job": "Original Music Composer"},
                    {"name": "Christopher Nolan", "job": "Director"}
                ]
            }
        }))),
        _ => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn tv_detail(AxumPath(id): AxumPath<u64>, Query(params): Params) -> Result<Json<Value>, StatusCode> {
    authorized(&params)?;
    Ok(Json(json!({
        "id": id,
        "name": "Breaking Bad",
        "genres": [{"name": "Drama"}],
        "first_air_date": "2008-01-20",
        "episode_run_time": [47, 45],
        "credits": {"cast": [], "crew": null},
        "external_ids": {"imdb_id": null}
    })))
}

async fn rating(Query(params): Params) -> Result<Json<Value>, StatusCode> {
    if params.get("apikey").map(String::as_str) != Some(RATINGS_KEY) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    match params.get("i").map(String::as_str) {
        Some("tt1375666") => Ok(Json(json!({"Title": "Inception", "imdbRating": "8.8"}))),
        _ => Ok(Json(json!({"Response": "False"}))),
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn start_metadata_mock() -> String {
    let app = Router::new()
        .route("/3/search/multi", get(search_multi))
        .route("/3/movie/{id}", get(movie_detail))
        .route("/3/tv/{id}", get(tv_detail));
    format!("{}/3/", serve(app).await)
}

async fn start_ratings_mock() -> String {
    let app = Router::new().route("/", get(rating));
    format!("{}/", serve(app).await)
}

// A port with nothing listening on it.
async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}

fn settings(ratings: bool) -> Settings {
    Settings {
        metadata_api_key: API_KEY.to_string(),
        ratings_api_key: if ratings { RATINGS_KEY.to_string() } else { String::new() },
        ..Settings::default()
    }
}

fn write_template(vault: &Path, template: &str) {
    let dir = vault.join("Assets/Templates");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("Movie Template.md"), template).unwrap();
}

const TEMPLATE: &str = "---
title: \"{{VALUE:Title}}\"
type: {{VALUE:Type}}
genre: {{VALUE:Genre}}
runtime: {{VALUE:Runtime}}
director: {{VALUE:Director}}
cast: {{VALUE:Actors}}
rating: {{VALUE:imdbRating}}
imdb: {{VALUE:imdbID}}
plot: \"{{VALUE:Plot}}\"
---
# {{VALUE:Title}} ({{VALUE:Year}})
";

#[tokio::test]
async fn test_search_filters_and_maps_results() {
    let api = start_metadata_mock().await;
    let client = MetadataClient::new(Endpoints::with_bases(api, closed_port_url().await));

    let results = client.search("in", &settings(false)).await.unwrap();

    let summary: Vec<(&str, &str, MediaKind)> = results
        .iter()
        .map(|r| (r.title.as_str(), r.year.as_str(), r.kind))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Inception", "2010", MediaKind::Movie),
            ("Breaking Bad", "2008", MediaKind::Tv),
            ("The Matrix", "1999", MediaKind::Movie),
            ("Untitled Project", "Unknown", MediaKind::Movie),
        ]
    );
    assert_eq!(results[0].poster_url, "https://image.tmdb.org/t/p/w92/inception.jpg");
    assert_eq!(results[1].poster_url, cinenote::provider::PLACEHOLDER_POSTER);
}

#[tokio::test]
async fn test_wrong_key_is_a_request_error() {
    let api = start_metadata_mock().await;
    let client = MetadataClient::new(Endpoints::with_bases(api, closed_port_url().await));
    let mut settings = settings(false);
    settings.metadata_api_key = "wrong".to_string();

    let err = client.search("in", &settings).await.unwrap_err();
    match err {
        Error::Request { endpoint, source } => {
            assert_eq!(endpoint, "search");
            assert_eq!(source.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
            assert!(!source.to_string().contains("wrong"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_detail_merges_rating() {
    let api = start_metadata_mock().await;
    let ratings = start_ratings_mock().await;
    let client = MetadataClient::new(Endpoints::with_bases(api, ratings));

    let detail = client
        .get_detail(27205, MediaKind::Movie, &settings(true))
        .await
        .unwrap();

    assert_eq!(detail.title, "Inception");
    assert_eq!(detail.runtime_minutes, Some(148));
    assert_eq!(detail.director.as_deref(), Some("Christopher Nolan"));
    assert_eq!(detail.top_cast.len(), 5);
    assert!(!detail.top_cast.contains(&"Cillian Murphy".to_string()));
    assert_eq!(detail.external_id.as_deref(), Some("tt1375666"));
    assert_eq!(detail.external_rating.as_deref(), Some("8.8"));
    assert_eq!(detail.year.as_deref(), Some("2010"));
    assert_eq!(
        detail.poster_url.as_deref(),
        Some("https://image.tmdb.org/t/p/w500/inception.jpg")
    );
}

#[tokio::test]
async fn test_tv_detail_uses_episode_runtime_and_skips_rating() {
    let api = start_metadata_mock().await;
    let ratings = start_ratings_mock().await;
    let client = MetadataClient::new(Endpoints::with_bases(api, ratings));

    let detail = client.get_detail(1396, MediaKind::Tv, &settings(true)).await.unwrap();

    assert_eq!(detail.title, "Breaking Bad");
    assert_eq!(detail.kind, MediaKind::Tv);
    assert_eq!(detail.runtime_minutes, Some(47));
    assert_eq!(detail.director, None);
    assert!(detail.top_cast.is_empty());
    assert_eq!(detail.external_id, None);
    assert_eq!(detail.external_rating, None);
}

#[tokio::test]
async fn test_inception_end_to_end() {
    let api = start_metadata_mock().await;
    let ratings = start_ratings_mock().await;
    let client = Arc::new(MetadataClient::new(Endpoints::with_bases(api, ratings)));

    let vault_dir = tempfile::tempdir().unwrap();
    write_template(vault_dir.path(), TEMPLATE);
    let generator = NoteGenerator::new(
        Arc::clone(&client),
        FsVault::new(vault_dir.path()).with_open_notes(false),
    );

    let (selected, note) = create_from_query(&generator, client.as_ref(), "Inception", 0, &settings(true))
        .await
        .unwrap()
        .expect("first result should produce a note");

    assert_eq!(selected.id, 27205);
    assert_eq!(note.vault_path, "Movies/MovieData/Inception.md");
    assert_eq!(note.location, vault_dir.path().join("Movies/MovieData/Inception.md"));

    let body = std::fs::read_to_string(&note.location).unwrap();
    assert!(body.contains("Action, Sci-Fi"));
    assert!(body.contains("148 minutes"));
    assert!(body.contains("Christopher Nolan"));
    assert!(body.contains("rating: 8.8"));
    assert!(body.contains("imdb: tt1375666"));
    assert!(body.contains(r#"plot: "A thief who steals \"corporate secrets\" through dreams.""#));
    assert!(body.contains("# Inception (2010)"));
}

#[tokio::test]
async fn test_rating_transport_error_still_creates_note() {
    let api = start_metadata_mock().await;
    let client = Arc::new(MetadataClient::new(Endpoints::with_bases(api, closed_port_url().await)));

    let vault_dir = tempfile::tempdir().unwrap();
    write_template(vault_dir.path(), TEMPLATE);
    let generator = NoteGenerator::new(
        Arc::clone(&client),
        FsVault::new(vault_dir.path()).with_open_notes(false),
    );

    let (_, note) = create_from_query(&generator, client.as_ref(), "Inception", 0, &settings(true))
        .await
        .unwrap()
        .unwrap();

    let body = std::fs::read_to_string(&note.location).unwrap();
    assert!(body.contains("rating: N/A"));
    assert!(body.contains("Christopher Nolan"));
}

#[tokio::test]
async fn test_server_error_aborts_without_note() {
    let api = start_metadata_mock().await;
    let client = Arc::new(MetadataClient::new(Endpoints::with_bases(api, closed_port_url().await)));

    let vault_dir = tempfile::tempdir().unwrap();
    write_template(vault_dir.path(), TEMPLATE);
    let generator = NoteGenerator::new(
        Arc::clone(&client),
        FsVault::new(vault_dir.path()).with_open_notes(false),
    );

    // The Matrix (id 603) is answered with a 500 by the detail endpoint.
    let err = create_from_query(&generator, client.as_ref(), "in", 2, &settings(false))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Request { endpoint: "detail", .. }));
    assert!(!vault_dir.path().join("Movies").exists());
}

#[tokio::test]
async fn test_pick_past_the_end_creates_nothing() {
    let api = start_metadata_mock().await;
    let client = Arc::new(MetadataClient::new(Endpoints::with_bases(api, closed_port_url().await)));

    let vault_dir = tempfile::tempdir().unwrap();
    let generator = NoteGenerator::new(
        Arc::clone(&client),
        FsVault::new(vault_dir.path()).with_open_notes(false),
    );

    let created = create_from_query(&generator, client.as_ref(), "in", 10, &settings(false))
        .await
        .unwrap();
    assert!(created.is_none());
}
