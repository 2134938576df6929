#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use planscope_lib::{
    core::errors::AppResult,
    providers::{ChatMessage, ExtractionOracle},
};
use serde_json::Value;

type Responder = Box<dyn Fn(usize, &[ChatMessage]) -> AppResult<String> + Send + Sync>;

/// In-memory oracle. The responder gets the zero-based call index and the
/// messages; every call is recorded.
pub struct ScriptedOracle {
    responder: Responder,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedOracle {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(usize, &[ChatMessage]) -> AppResult<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(vec![]),
        })
    }

    /// Replies in order; once the script runs out every call gets `[]`.
    pub fn replying(responses: &[&str]) -> Arc<Self> {
        let script: Vec<String> = responses.iter().map(|r| r.to_string()).collect();
        Self::new(move |idx, _| Ok(script.get(idx).cloned().unwrap_or_else(|| "[]".to_string())))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    /// The JSON user payload of every call, in call order.
    pub fn payloads(&self) -> Vec<Value> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|messages| user_payload(messages))
            .collect()
    }
}

impl ExtractionOracle for ScriptedOracle {
    fn complete(&self, messages: &[ChatMessage]) -> AppResult<String> {
        let idx = {
            let mut calls = self.calls.lock().expect("calls lock");
            calls.push(messages.to_vec());
            calls.len() - 1
        };
        (self.responder)(idx, messages)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn user_payload(messages: &[ChatMessage]) -> Value {
    let user = messages.last().expect("user message present");
    serde_json::from_str(&user.content).expect("user payload is JSON")
}

/// Multi-page PDF, one line of Helvetica text per page.
pub fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
    use lopdf::{dictionary, Object, Stream};

    let mut doc = lopdf::Document::with_version("1.5");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ];

    let mut page_ids = Vec::new();
    for text in texts {
        let content_str = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let stream = Stream::new(dictionary! {}, content_str.into_bytes());
        let content_id = doc.add_object(stream);

        let resources = dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font_id) },
        };

        let page_dict = dictionary! {
            "Type" => "Page",
            "MediaBox" => media_box.clone(),
            "Contents" => Object::Reference(content_id),
            "Resources" => resources,
        };
        page_ids.push(doc.add_object(page_dict));
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(texts.len() as i64),
    };
    let pages_id = doc.add_object(pages_dict);

    for &pid in &page_ids {
        if let Ok(page_obj) = doc.get_object_mut(pid) {
            if let Ok(dict) = page_obj.as_dict_mut() {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("pdf should serialize");
    buf
}
