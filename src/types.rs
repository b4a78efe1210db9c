use serde::{Deserialize, Serialize};

/// One page of a subreddit listing, flattened from the wire envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub posts: Vec<Post>,
    pub after: Option<String>,
}

// Reddit listing wire envelope: {"kind":"Listing","data":{"after":..,"children":[..]}}.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData {
    pub after: Option<String>,
    pub children: Vec<Thing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thing {
    pub data: Post,
}

/// Essential submission metadata from a listing payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub subreddit: String,
    pub permalink: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub is_self: bool,
    #[serde(default)]
    pub is_video: bool,
}

impl Post {
    /// Outbound media URL for link posts; self posts have none.
    pub fn media_url(&self) -> Option<&str> {
        if self.is_self {
            return None;
        }
        self.url.as_deref()
    }
}

impl From<Listing> for ListingPage {
    fn from(listing: Listing) -> Self {
        ListingPage {
            after: listing.data.after,
            posts: listing.data.children.into_iter().map(|t| t.data).collect(),
        }
    }
}
