//! ============================================================================
//! Profile Mapper - StackExchange `/me` response to canonical profile fields
//! ============================================================================
//! The API wraps every result in an `items` array. Only the first item is
//! read; an empty array is an error rather than a blank user.
//! ============================================================================

use serde::Deserialize;

use crate::error::{AuthError, Result};

/// Profile fields extracted from the `/me` response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub user_id: String,
    pub name: String,
    pub nick_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub description: String,
    pub avatar_url: String,
    pub location: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    items: Vec<MeItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MeItem {
    user_id: i64,
    email: String,
    about_me: String,
    display_name: String,
    first_name: String,
    last_name: String,
    link: String,
    profile_image: String,
    location: String,
}

/// Decode a `/me` response body into [`ProfileFields`]
pub fn map_profile(body: &[u8]) -> Result<ProfileFields> {
    let response: MeResponse = serde_json::from_slice(body)?;
    let item = response
        .items
        .into_iter()
        .next()
        .ok_or(AuthError::EmptyProfile)?;

    Ok(ProfileFields {
        user_id: item.user_id.to_string(),
        nick_name: item.display_name.clone(),
        name: item.display_name,
        first_name: item.first_name,
        last_name: item.last_name,
        email: item.email,
        description: item.about_me,
        avatar_url: item.profile_image,
        location: item.location,
        link: item.link,
    })
}
