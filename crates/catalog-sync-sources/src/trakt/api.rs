use catalog_sync_models::{
    EpisodeRef, HistoryEvent, ListedItem, MediaKind, PersonHit, PlaybackProgress, ProviderIds,
    SearchHit, SearchSource, WatchTarget,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::traits::AggregateRating;

#[derive(Debug, Clone, Deserialize)]
pub struct TraktIds {
    pub trakt: Option<u64>,
    pub slug: Option<String>,
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TraktTitle {
    title: Option<String>,
    year: Option<i32>,
    ids: TraktIds,
}

#[derive(Debug, Deserialize)]
struct TraktEpisode {
    season: u32,
    number: u32,
    title: Option<String>,
    ids: Option<TraktIds>,
}

/// Trending endpoints wrap each title with a watcher count.
#[derive(Debug, Deserialize)]
struct TrendingEntry {
    movie: Option<TraktTitle>,
    show: Option<TraktTitle>,
}

#[derive(Debug, Deserialize)]
struct ListItemEntry {
    #[serde(rename = "type")]
    item_type: String,
    movie: Option<TraktTitle>,
    show: Option<TraktTitle>,
}

#[derive(Debug, Deserialize)]
struct RatingsResponse {
    rating: f32,
    votes: u32,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    movie: Option<TraktTitle>,
    show: Option<TraktTitle>,
    person: Option<TraktPerson>,
}

#[derive(Debug, Deserialize)]
struct TraktPerson {
    name: String,
    ids: TraktIds,
    known_for_department: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivityEntry {
    progress: Option<f32>,
    paused_at: Option<String>,
    watched_at: Option<String>,
    #[serde(rename = "type")]
    item_type: String,
    movie: Option<TraktTitle>,
    show: Option<TraktTitle>,
    episode: Option<TraktEpisode>,
}

#[derive(Debug, Deserialize)]
struct ShowProgress {
    next_episode: Option<TraktEpisode>,
}

/// Remove slashes from IMDB ID (Trakt sometimes includes them)
fn clean_imdb(id: Option<String>) -> Option<String> {
    id.map(|s| s.replace('/', "")).filter(|s| !s.is_empty())
}

fn provider_ids(ids: TraktIds) -> ProviderIds {
    ProviderIds {
        trakt: ids.trakt,
        slug: ids.slug,
        imdb: clean_imdb(ids.imdb),
        tmdb: ids.tmdb,
    }
}

fn listed(kind: MediaKind, title: TraktTitle) -> ListedItem {
    ListedItem {
        kind,
        title: title.title.unwrap_or_default(),
        year: title.year,
        ids: provider_ids(title.ids),
    }
}

fn episode_ref(episode: TraktEpisode) -> EpisodeRef {
    EpisodeRef {
        season: episode.season,
        number: episode.number,
        title: episode.title,
        trakt_id: episode.ids.and_then(|ids| ids.trakt),
    }
}

fn watch_target(entry: &mut ActivityEntry) -> Option<WatchTarget> {
    match entry.item_type.as_str() {
        "movie" => entry.movie.take().map(|m| WatchTarget::Movie {
            movie: listed(MediaKind::Movie, m),
        }),
        "episode" => match (entry.show.take(), entry.episode.take()) {
            (Some(show), Some(episode)) => Some(WatchTarget::Episode {
                show: listed(MediaKind::Show, show),
                episode: episode_ref(episode),
            }),
            _ => None,
        },
        _ => None,
    }
}

fn with_headers(request: RequestBuilder, client_id: &str, access_token: Option<&str>) -> RequestBuilder {
    let request = request
        .header("trakt-api-version", "2")
        .header("trakt-api-key", client_id)
        .header("Accept", "application/json")
        .header("Content-Type", "application/json");
    match access_token {
        Some(token) => request.header("Authorization", format!("Bearer {}", token)),
        None => request,
    }
}

async fn get_text(
    client: &Client,
    url: &str,
    client_id: &str,
    access_token: Option<&str>,
) -> Result<String, SourceError> {
    debug!("GET {}", url);
    let response = with_headers(client.get(url), client_id, access_token).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(SourceError::from_status(status, error_text));
    }

    Ok(response.text().await?)
}

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    client_id: &str,
    access_token: Option<&str>,
) -> Result<T, SourceError> {
    let body = get_text(client, url, client_id, access_token).await?;
    Ok(serde_json::from_str(&body)?)
}

pub(crate) fn parse_trending(kind: MediaKind, body: &str) -> Result<Vec<ListedItem>, SourceError> {
    let entries: Vec<TrendingEntry> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .filter_map(|e| match kind {
            MediaKind::Movie => e.movie,
            MediaKind::Show => e.show,
        })
        .map(|t| listed(kind, t))
        .collect())
}

pub(crate) fn parse_list_items(body: &str) -> Result<Vec<ListedItem>, SourceError> {
    let entries: Vec<ListItemEntry> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .filter_map(|e| match e.item_type.as_str() {
            "movie" => e.movie.map(|t| listed(MediaKind::Movie, t)),
            "show" => e.show.map(|t| listed(MediaKind::Show, t)),
            other => {
                debug!("Skipping list item of type {}", other);
                None
            }
        })
        .collect())
}

pub(crate) fn parse_activity(body: &str) -> Result<Vec<(ActivityMeta, WatchTarget)>, SourceError> {
    let entries: Vec<ActivityEntry> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .filter_map(|mut e| {
            let target = watch_target(&mut e)?;
            let meta = ActivityMeta {
                progress: e.progress,
                paused_at: e.paused_at,
                watched_at: e.watched_at,
            };
            Some((meta, target))
        })
        .collect())
}

pub(crate) struct ActivityMeta {
    progress: Option<f32>,
    paused_at: Option<String>,
    watched_at: Option<String>,
}

pub async fn get_trending(
    client: &Client,
    base_url: &str,
    client_id: &str,
    kind: MediaKind,
    page: u32,
    limit: u32,
) -> Result<Vec<ListedItem>, SourceError> {
    let url = format!("{}/{}/trending?page={}&limit={}", base_url, kind.plural(), page, limit);
    let body = get_text(client, &url, client_id, None).await?;
    parse_trending(kind, &body)
}

pub async fn get_popular(
    client: &Client,
    base_url: &str,
    client_id: &str,
    kind: MediaKind,
    page: u32,
    limit: u32,
) -> Result<Vec<ListedItem>, SourceError> {
    let url = format!("{}/{}/popular?page={}&limit={}", base_url, kind.plural(), page, limit);
    let titles: Vec<TraktTitle> = get_json(client, &url, client_id, None).await?;
    Ok(titles.into_iter().map(|t| listed(kind, t)).collect())
}

pub async fn get_user_list_items(
    client: &Client,
    base_url: &str,
    client_id: &str,
    owner: &str,
    slug: &str,
    page: u32,
    limit: u32,
) -> Result<Vec<ListedItem>, SourceError> {
    let url = format!(
        "{}/users/{}/lists/{}/items?page={}&limit={}",
        base_url,
        urlencoding::encode(owner),
        urlencoding::encode(slug),
        page,
        limit
    );
    let body = get_text(client, &url, client_id, None).await?;
    parse_list_items(&body)
}

pub async fn get_ratings(
    client: &Client,
    base_url: &str,
    client_id: &str,
    kind: MediaKind,
    trakt_id: u64,
) -> Result<AggregateRating, SourceError> {
    let url = format!("{}/{}/{}/ratings", base_url, kind.plural(), trakt_id);
    let ratings: RatingsResponse = get_json(client, &url, client_id, None).await?;
    Ok(AggregateRating {
        rating: ratings.rating,
        votes: ratings.votes,
    })
}

/// Normalize a free-text query (commas to spaces, collapse whitespace)
fn normalize_query(query: &str) -> String {
    query
        .replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub async fn search_titles(
    client: &Client,
    base_url: &str,
    client_id: &str,
    kind: MediaKind,
    query: &str,
    limit: u32,
) -> Result<Vec<SearchHit>, SourceError> {
    let url = format!(
        "{}/search/{}?query={}&limit={}",
        base_url,
        kind.as_str(),
        urlencoding::encode(&normalize_query(query)),
        limit
    );
    let entries: Vec<SearchEntry> = get_json(client, &url, client_id, None).await?;
    Ok(entries
        .into_iter()
        .filter_map(|e| match kind {
            MediaKind::Movie => e.movie,
            MediaKind::Show => e.show,
        })
        .map(|t| SearchHit {
            kind,
            title: t.title.unwrap_or_default(),
            year: t.year,
            trakt_id: t.ids.trakt,
            tmdb_id: t.ids.tmdb,
            overview: None,
            poster_url: None,
            backdrop_url: None,
            rating: None,
            source: SearchSource::Trakt,
        })
        .collect())
}

pub async fn search_people(
    client: &Client,
    base_url: &str,
    client_id: &str,
    query: &str,
    limit: u32,
) -> Result<Vec<PersonHit>, SourceError> {
    let url = format!(
        "{}/search/person?query={}&limit={}",
        base_url,
        urlencoding::encode(&normalize_query(query)),
        limit
    );
    let entries: Vec<SearchEntry> = get_json(client, &url, client_id, None).await?;
    Ok(entries
        .into_iter()
        .filter_map(|e| e.person)
        .map(|p| PersonHit {
            name: p.name,
            trakt_id: p.ids.trakt,
            tmdb_id: p.ids.tmdb,
            profile_url: None,
            known_for: p.known_for_department,
            source: SearchSource::Trakt,
        })
        .collect())
}

pub async fn get_playback(
    client: &Client,
    base_url: &str,
    client_id: &str,
    access_token: &str,
) -> Result<Vec<PlaybackProgress>, SourceError> {
    let url = format!("{}/sync/playback", base_url);
    let body = get_text(client, &url, client_id, Some(access_token)).await?;
    Ok(parse_activity(&body)?
        .into_iter()
        .filter_map(|(meta, target)| match (meta.progress, meta.paused_at) {
            (Some(progress), Some(paused_at)) => Some(PlaybackProgress {
                progress,
                paused_at,
                target,
            }),
            _ => {
                warn!("Skipping playback entry without progress or paused_at");
                None
            }
        })
        .collect())
}

pub async fn get_history(
    client: &Client,
    base_url: &str,
    client_id: &str,
    access_token: &str,
    limit: u32,
) -> Result<Vec<HistoryEvent>, SourceError> {
    let url = format!("{}/sync/history?page=1&limit={}", base_url, limit);
    let body = get_text(client, &url, client_id, Some(access_token)).await?;
    Ok(parse_activity(&body)?
        .into_iter()
        .filter_map(|(meta, target)| {
            meta.watched_at
                .map(|watched_at| HistoryEvent { watched_at, target })
        })
        .collect())
}

pub async fn get_next_episode(
    client: &Client,
    base_url: &str,
    client_id: &str,
    access_token: &str,
    show_id: u64,
) -> Result<Option<EpisodeRef>, SourceError> {
    let url = format!("{}/shows/{}/progress/watched", base_url, show_id);
    let progress: ShowProgress = get_json(client, &url, client_id, Some(access_token)).await?;
    Ok(progress.next_episode.map(episode_ref))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trending_movies() {
        let body = r#"[
            {"watchers": 21, "movie": {"title": "Dune", "year": 2021, "ids": {"trakt": 1, "slug": "dune-2021", "imdb": "tt1160419", "tmdb": 438631}}},
            {"watchers": 9, "movie": {"title": "Heat", "year": 1995, "ids": {"trakt": 2, "slug": "heat-1995", "imdb": null, "tmdb": null}}}
        ]"#;
        let items = parse_trending(MediaKind::Movie, body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Dune");
        assert_eq!(items[0].ids.tmdb, Some(438631));
        assert_eq!(items[1].ids.tmdb, None);
    }

    #[test]
    fn test_parse_list_items_mixed_types() {
        let body = r#"[
            {"rank": 1, "type": "movie", "movie": {"title": "Alien", "year": 1979, "ids": {"trakt": 5, "imdb": "/tt0078748", "tmdb": 348}}},
            {"rank": 2, "type": "show", "show": {"title": "Dark", "year": 2017, "ids": {"trakt": 6, "tmdb": 70523}}},
            {"rank": 3, "type": "person", "person": {"name": "Someone", "ids": {"trakt": 7}}}
        ]"#;
        let items = parse_list_items(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, MediaKind::Movie);
        assert_eq!(items[0].ids.imdb.as_deref(), Some("tt0078748"));
        assert_eq!(items[1].kind, MediaKind::Show);
    }

    #[test]
    fn test_parse_activity_episode() {
        let body = r#"[
            {"progress": 35.5, "paused_at": "2024-05-01T20:00:00.000Z", "type": "episode",
             "episode": {"season": 2, "number": 4, "title": "Ep", "ids": {"trakt": 99}},
             "show": {"title": "Severance", "year": 2022, "ids": {"trakt": 42, "tmdb": 95396}}},
            {"progress": 10.0, "paused_at": "2024-05-02T20:00:00.000Z", "type": "episode",
             "episode": {"season": 1, "number": 1, "title": null}}
        ]"#;
        let parsed = parse_activity(body).unwrap();
        assert_eq!(parsed.len(), 1);
        let (meta, target) = &parsed[0];
        assert_eq!(meta.progress, Some(35.5));
        assert_eq!(target.show_id(), Some(42));
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  Crouching Tiger,  Hidden   Dragon "), "Crouching Tiger Hidden Dragon");
    }
}
