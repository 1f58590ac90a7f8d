//! Browser wallet and chain balance adapters
//!
//! `InjectedWallet` drives the wallet extension object the page exposes as
//! `window.solana` (Phantom and compatible). `RpcBalance` asks a Solana
//! JSON-RPC node for the account balance.

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use gloo_net::http::Request;
use js_sys::{Function, Promise, Reflect};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error::EligibilityError;
use crate::session::eligibility::{BalanceOracle, LAMPORTS_PER_SOL, WalletProvider};

pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// The injected provider, if any
pub fn injected_provider() -> Option<JsValue> {
    let window = web_sys::window()?;
    let provider = Reflect::get(&window, &JsValue::from_str("solana")).ok()?;
    (!provider.is_undefined() && !provider.is_null()).then_some(provider)
}

/// Call `target[name](...args)` and await the returned promise
async fn call_async(target: &JsValue, name: &str, args: &js_sys::Array) -> Result<JsValue, JsValue> {
    let method: Function = Reflect::get(target, &JsValue::from_str(name))?.dyn_into()?;
    let promise: Promise = method.apply(target, args)?.dyn_into()?;
    JsFuture::from(promise).await
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InjectedWallet;

impl InjectedWallet {
    /// Run `callback` whenever the extension reports a disconnect
    pub fn on_disconnect(&self, callback: impl FnMut() + 'static) -> Result<(), JsValue> {
        let provider = injected_provider().ok_or_else(|| JsValue::from_str("no wallet"))?;
        let on: Function = Reflect::get(&provider, &JsValue::from_str("on"))?.dyn_into()?;
        let closure = Closure::<dyn FnMut()>::new(callback);
        on.call2(&provider, &JsValue::from_str("disconnect"), closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }
}

impl WalletProvider for InjectedWallet {
    fn connect(&self) -> LocalBoxFuture<'static, Result<String, EligibilityError>> {
        async {
            let provider = injected_provider().ok_or(EligibilityError::NoWallet)?;
            let response = call_async(&provider, "connect", &js_sys::Array::new())
                .await
                .map_err(|e| EligibilityError::Rejected(js_message(&e)))?;
            let key = Reflect::get(&response, &JsValue::from_str("publicKey"))
                .map_err(|e| EligibilityError::Rejected(js_message(&e)))?;
            let to_string: Function = Reflect::get(&key, &JsValue::from_str("toString"))
                .and_then(|f| f.dyn_into())
                .map_err(|e| EligibilityError::Rejected(js_message(&e)))?;
            to_string
                .call0(&key)
                .ok()
                .and_then(|s| s.as_string())
                .ok_or_else(|| EligibilityError::Rejected("wallet returned no public key".into()))
        }
        .boxed_local()
    }

    fn disconnect(&self) -> LocalBoxFuture<'static, Result<(), EligibilityError>> {
        async {
            let provider = injected_provider().ok_or(EligibilityError::NoWallet)?;
            call_async(&provider, "disconnect", &js_sys::Array::new())
                .await
                .map_err(|e| EligibilityError::Rejected(js_message(&e)))?;
            Ok(())
        }
        .boxed_local()
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: [&'a str; 1],
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<BalanceResult>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct BalanceResult {
    value: u64,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
}

#[derive(Debug, Clone)]
pub struct RpcBalance {
    url: String,
}

impl RpcBalance {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for RpcBalance {
    fn default() -> Self {
        Self::new(DEVNET_RPC_URL)
    }
}

impl BalanceOracle for RpcBalance {
    fn balance_sol(&self, wallet: &str) -> LocalBoxFuture<'static, Result<f64, EligibilityError>> {
        let url = self.url.clone();
        let wallet = wallet.to_string();
        async move {
            let oracle = |e: gloo_net::Error| EligibilityError::Oracle(e.to_string());
            let body = RpcRequest {
                jsonrpc: "2.0",
                id: 1,
                method: "getBalance",
                params: [&wallet],
            };
            let resp = Request::post(&url).json(&body).map_err(oracle)?.send().await.map_err(oracle)?;
            if !resp.ok() {
                return Err(EligibilityError::Oracle(format!("HTTP {}", resp.status())));
            }
            let reply: RpcResponse = resp.json().await.map_err(oracle)?;
            match (reply.result, reply.error) {
                (Some(result), _) => Ok(result.value as f64 / LAMPORTS_PER_SOL),
                (None, Some(err)) => Err(EligibilityError::Oracle(err.message)),
                (None, None) => Err(EligibilityError::Oracle("empty RPC reply".into())),
            }
        }
        .boxed_local()
    }
}
