//! Inbound message handling and outbound `send`.
//!
//! For one inbound data message the order is fixed: normalize, inject
//! script/style, store `msg`, bump `msgsReceived`. Listeners run inside the
//! store writes, so by the time a `msg` listener fires the counter has not
//! moved yet and the document already holds the injected blocks.

use serde_json::Value;
use uib_core::{LogKind, Message, PropertyKey, is_truthy, normalize_message};

use crate::context::Context;

/// Which logical channel a message arrived on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Route {
    Data,
    Control,
    Unknown,
}

pub(crate) fn classify(ctx: &Context, channel: &str) -> Route {
    let channels = &ctx.settings.channels;
    if channel == channels.server {
        Route::Data
    } else if channel == channels.control {
        Route::Control
    } else {
        Route::Unknown
    }
}

/// Dispatch a raw inbound message by channel.
pub(crate) fn route_inbound(ctx: &Context, channel: &str, raw: Value) {
    match classify(ctx, channel) {
        Route::Data => receive_data(ctx, raw),
        Route::Control => receive_control(ctx, raw),
        Route::Unknown => ctx.log.log(
            LogKind::Warn,
            format!("ignoring message on unknown channel {channel} - namespace: {}", ctx.namespace),
        ),
    }
}

pub(crate) fn receive_data(ctx: &Context, raw: Value) {
    ctx.log.log(
        LogKind::Info,
        format!("msg received - namespace: {}", ctx.namespace),
    );
    ctx.log.dir("received", &raw);

    let mut message = normalize_message(raw);
    inject(ctx, &mut message, Block::Script);
    inject(ctx, &mut message, Block::Style);

    ctx.store.set_internal(PropertyKey::Msg, Value::Object(message));
    let _ = ctx.store.increment(PropertyKey::MsgsReceived);
}

pub(crate) fn receive_control(ctx: &Context, raw: Value) {
    ctx.log.log(
        LogKind::Info,
        format!("control msg received - namespace: {}", ctx.namespace),
    );
    ctx.log.dir("control", &raw);

    let message = normalize_message(raw);
    if let Some(flag) = message.get("debug") {
        let on = is_truthy(flag);
        let _ = ctx.log.set_enabled(on);
        ctx.log
            .log(LogKind::Log, format!("debug set to {on} by control message"));
    }

    ctx.store.set_internal(PropertyKey::CtrlMsg, Value::Object(message));
    let _ = ctx.store.increment(PropertyKey::MsgsCtrl);
}

/// Record and emit an outbound message on the client-to-server channel.
///
/// The message goes out as given; nothing checks that it is an object.
pub(crate) fn send(ctx: &Context, message: Value) {
    ctx.log.log(
        LogKind::Info,
        format!("msg sent - namespace: {}", ctx.namespace),
    );
    ctx.log.dir("sent", &message);

    ctx.store.set_internal(PropertyKey::SentMsg, message.clone());
    let _ = ctx.store.increment(PropertyKey::MsgsSent);

    let channel = &ctx.settings.channels.client;
    if let Err(err) = ctx.transport.emit(channel, &message) {
        ctx.log.log(LogKind::Error, format!("send failed: {err}"));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Script and style injection
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
enum Block {
    Script,
    Style,
}

impl Block {
    const fn field(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
        }
    }

    const fn allow_flag(self) -> &'static str {
        match self {
            Self::Script => "allowScript",
            Self::Style => "allowStyle",
        }
    }

    const fn remove_flag(self) -> &'static str {
        match self {
            Self::Script => "removeScript",
            Self::Style => "removeStyle",
        }
    }
}

fn inject(ctx: &Context, message: &mut Message, block: Block) {
    if !ctx.store.flag(block.allow_flag()) {
        return;
    }
    let Some(value) = message.get(block.field()) else {
        return;
    };

    match block_text(value) {
        Some(text) => match block {
            Block::Script => ctx.document.append_script(&text),
            Block::Style => ctx.document.append_style(&text),
        },
        None => ctx.log.log(
            LogKind::Log,
            format!("msg.{} has nothing to inject", block.field()),
        ),
    }

    if ctx.store.flag(block.remove_flag()) {
        let _ = message.remove(block.field());
    }
}

/// Text to inject: a non-empty string, or an array of strings joined with
/// newlines. Anything else yields nothing.
fn block_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Array(lines) => lines
            .iter()
            .map(Value::as_str)
            .collect::<Option<Vec<&str>>>()?
            .join("\n"),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
