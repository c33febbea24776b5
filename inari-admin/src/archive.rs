//! Browsing of already published posts and hosted media.
//!
//! Listing is best effort: a failed sub-query is logged and shows up as an
//! empty list rather than failing the page.

use std::{future::Future, sync::Arc};

use inari_common::UserSession;
use inari_micropub::{
    ArchiveMonth, ArchiveYear, MediaItem, MediaList, MediaQuery, MicropubClient, PostList,
};
use serde::Serialize;

/// One page of the media archive plus the year/month pickers around it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaArchivePage {
    pub years: Vec<ArchiveYear>,
    pub months: Vec<ArchiveMonth>,
    pub media: Vec<MediaItem>,
    pub after_key: String,
    pub current_year: String,
    pub current_month: String,
}

/// Latest posts and the years they span.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostsPage {
    pub posts: PostList,
    pub years: Vec<ArchiveYear>,
}

/// Which part of the media archive to show. Empty fields pick defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSelection {
    pub after: String,
    pub year: String,
    pub month: String,
}

#[derive(Debug, Clone)]
pub struct Archive {
    micropub: Arc<dyn MicropubClient>,
}

impl Archive {
    pub fn new(micropub: Arc<dyn MicropubClient>) -> Self {
        Self { micropub }
    }

    pub async fn list_media(
        &self,
        session: &UserSession,
        selection: MediaSelection,
    ) -> MediaArchivePage {
        let endpoint = session.media_endpoint.as_str();
        let token = session.access_token.as_str();

        let years = best_effort("years", self.micropub.query_years_list(endpoint, token)).await;
        let current_year = if selection.year.is_empty() {
            years.first().map(|y| y.year.clone()).unwrap_or_default()
        } else {
            selection.year
        };

        let months = if current_year.is_empty() {
            Vec::new()
        } else {
            best_effort(
                "months",
                self.micropub.query_months_list(endpoint, token, &current_year),
            )
            .await
        };
        let current_month = if selection.month.is_empty() {
            months.first().map(|m| m.month.clone()).unwrap_or_default()
        } else {
            selection.month
        };

        let query = if !selection.after.is_empty() {
            Some(MediaQuery::After(selection.after))
        } else if !current_year.is_empty() && !current_month.is_empty() {
            Some(MediaQuery::Month {
                year: current_year.clone(),
                month: current_month.clone(),
            })
        } else {
            None
        };

        let media: MediaList = match query {
            Some(query) => {
                best_effort("media", self.micropub.query_media_list(endpoint, token, &query)).await
            }
            None => MediaList::default(),
        };

        MediaArchivePage {
            after_key: media.after_key().to_string(),
            media: media.items,
            years,
            months,
            current_year,
            current_month,
        }
    }

    /// A single hosted media item.
    pub async fn media_item(
        &self,
        session: &UserSession,
        url: &str,
    ) -> inari_micropub::Result<MediaItem> {
        self.micropub
            .query_media_url(&session.media_endpoint, &session.access_token, url)
            .await
    }

    pub async fn query_posts(&self, session: &UserSession, after: Option<&str>) -> PostsPage {
        let endpoint = session.micropub_endpoint.as_str();
        let token = session.access_token.as_str();

        let posts = best_effort(
            "posts",
            self.micropub.query_post_list(endpoint, token, after),
        )
        .await;
        let years = best_effort("years", self.micropub.query_years_list(endpoint, token)).await;

        PostsPage { posts, years }
    }
}

async fn best_effort<T, F>(what: &str, query: F) -> T
where
    T: Default,
    F: Future<Output = inari_micropub::Result<T>>,
{
    match query.await {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(?error, what, "Archive query failed");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use inari_micropub::ListPaging;

    use super::*;
    use crate::composer::tests::{logged_in_session, FakeMicropub};

    fn year(year: &str) -> ArchiveYear {
        ArchiveYear {
            year: year.to_string(),
            count: 1,
        }
    }

    fn month(month: &str) -> ArchiveMonth {
        ArchiveMonth {
            month: month.to_string(),
            count: 1,
        }
    }

    #[tokio::test]
    async fn defaults_to_first_year_and_month() {
        let micropub = Arc::new(FakeMicropub {
            years: vec![year("2019"), year("2018")],
            months: vec![month("03"), month("02")],
            media: MediaList {
                items: vec![MediaItem {
                    url: "https://media.example.com/a.jpg".to_string(),
                    ..Default::default()
                }],
                paging: Some(ListPaging {
                    after: "next".to_string(),
                }),
            },
            ..Default::default()
        });

        let page = Archive::new(micropub.clone())
            .list_media(&logged_in_session(), MediaSelection::default())
            .await;

        assert_eq!(page.current_year, "2019");
        assert_eq!(page.current_month, "03");
        assert_eq!(page.media.len(), 1);
        assert_eq!(page.after_key, "next");
        assert_eq!(*micropub.month_queries.lock().unwrap(), ["2019"]);
        assert_eq!(
            *micropub.media_queries.lock().unwrap(),
            [MediaQuery::Month {
                year: "2019".to_string(),
                month: "03".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn after_cursor_wins() {
        let micropub = Arc::new(FakeMicropub {
            years: vec![year("2019")],
            months: vec![month("03")],
            ..Default::default()
        });

        let page = Archive::new(micropub.clone())
            .list_media(
                &logged_in_session(),
                MediaSelection {
                    after: "cursor".to_string(),
                    year: "2018".to_string(),
                    month: "12".to_string(),
                },
            )
            .await;

        assert_eq!(page.current_year, "2018");
        assert_eq!(page.current_month, "12");
        assert_eq!(page.after_key, "");
        assert_eq!(
            *micropub.media_queries.lock().unwrap(),
            [MediaQuery::After("cursor".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_archive_queries_nothing_further() {
        let micropub = Arc::new(FakeMicropub::default());

        let page = Archive::new(micropub.clone())
            .list_media(&logged_in_session(), MediaSelection::default())
            .await;

        assert_eq!(page, MediaArchivePage::default());
        assert!(micropub.month_queries.lock().unwrap().is_empty());
        assert!(micropub.media_queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_queries_show_empty_lists() {
        use httpmock::prelude::*;
        use inari_micropub::HttpMicropubClient;

        let server = MockServer::start_async().await;
        let failing = server
            .mock_async(|when, then| {
                when.method(GET).path("/media");
                then.status(500);
            })
            .await;
        let mut session = logged_in_session();
        session.media_endpoint = server.url("/media");

        let page = Archive::new(Arc::new(HttpMicropubClient::new().unwrap()))
            .list_media(
                &session,
                MediaSelection {
                    year: "2019".to_string(),
                    ..Default::default()
                },
            )
            .await;

        // years and months fail, the month is unknown so no media page is asked for
        failing.assert_hits_async(2).await;
        assert!(page.years.is_empty());
        assert!(page.media.is_empty());
        assert_eq!(page.current_year, "2019");
        assert_eq!(page.current_month, "");
    }

    #[tokio::test]
    async fn query_posts() {
        let micropub = Arc::new(FakeMicropub {
            years: vec![year("2019")],
            posts: PostList {
                items: Vec::new(),
                paging: Some(ListPaging {
                    after: "p2".to_string(),
                }),
            },
            ..Default::default()
        });

        let page = Archive::new(micropub)
            .query_posts(&logged_in_session(), None)
            .await;

        assert_eq!(page.years, [year("2019")]);
        assert_eq!(page.posts.paging.unwrap().after, "p2");
    }
}
