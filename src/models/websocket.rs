use crate::models::chat::ConversationId;
use crate::session::SessionSnapshot;
use serde::{ Serialize, Deserialize };

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "send")] Send {
        text: String,
        #[serde(default)]
        page_content: Option<String>,
    },
    #[serde(rename = "new_conversation")]
    NewConversation,
    #[serde(rename = "rename")] Rename {
        id: ConversationId,
        name: String,
    },
    #[serde(rename = "delete")] Delete {
        id: ConversationId,
    },
    #[serde(rename = "select")] Select {
        id: ConversationId,
    },
}

#[derive(Serialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "state")] State(SessionSnapshot),
    #[serde(rename = "error")] Error {
        message: String,
    },
}
