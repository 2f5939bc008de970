//! Wire payloads for the follow-graph events. Publication events carry the
//! shared [`newsfeed_common::Publication`] shape directly.

use serde::Deserialize;

/// `friends.requestsent` — the sender starts following the recipient.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSent {
    pub from_user: String,
    pub to_user: String,
}

/// `friends.requestcancelled` — the sender withdrew; drop the edge.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCancelled {
    pub from_user: String,
    pub to_user: String,
}

/// `friends.requestapproved` — the approver starts following the requester.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestApproved {
    pub user: String,
    pub requester: String,
}

/// `friends.deleted` — the friendship ended; drop the edge.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendDeleted {
    pub user: String,
    pub friend: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friend_payloads_decode_camel_case() {
        let sent: RequestSent =
            serde_json::from_str(r#"{"fromUser": "a", "toUser": "b"}"#).unwrap();
        assert_eq!(sent.from_user, "a");
        assert_eq!(sent.to_user, "b");

        let approved: RequestApproved =
            serde_json::from_str(r#"{"user": "a", "requester": "b"}"#).unwrap();
        assert_eq!(approved.user, "a");
        assert_eq!(approved.requester, "b");

        let deleted: FriendDeleted =
            serde_json::from_str(r#"{"user": "a", "friend": "b"}"#).unwrap();
        assert_eq!(deleted.friend, "b");
    }
}
