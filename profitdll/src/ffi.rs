//! Real gateway, behind the `real_gateway` feature: dynamically loads the
//! vendor SDK's shared library and drives it through its C ABI.
//!
//! The vendor SDK is not a crate — it ships as a native library the host
//! loads at runtime, the same way the original Python bridge used `ctypes`.
//! We mirror that with `libloading` rather than linking against it at build
//! time, so a workspace build never requires the library to be present.

use std::collections::HashMap;
use std::ffi::{c_char, c_double, c_int, c_longlong, c_void, CStr, CString};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Mutex;
use std::time::Duration;

use libloading::{Library, Symbol};
use once_cell::sync::OnceCell;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use fb_core::model::order::{Direction, Offset, Order, OrderStatus};
use fb_core::model::{Account, FullPosition};

use crate::api::{BrokerGateway, Credentials, DrainOutcome};
use crate::error::BrokerError;

const LIBRARY_ENV: &str = "BROKER_LIBRARY_PATH";
#[cfg(target_os = "windows")]
const DEFAULT_LIBRARY_NAME: &str = "TqBridge.dll";
#[cfg(not(target_os = "windows"))]
const DEFAULT_LIBRARY_NAME: &str = "libtqbridge.so";

type InitializeLoginFn =
    unsafe extern "system" fn(user: *const c_char, pass: *const c_char, key: *const c_char) -> c_int;
type FinalizeFn = unsafe extern "system" fn() -> c_int;
type SendOrderFn = unsafe extern "system" fn(*const COrderRequest) -> c_int;
type SendCancelFn = unsafe extern "system" fn(order_id: *const c_char) -> c_int;

type OrderCallbackRaw = unsafe extern "system" fn(event: *const COrderEvent, ctx: *mut c_void);
type PositionCallbackRaw =
    unsafe extern "system" fn(event: *const CPositionEvent, ctx: *mut c_void);
type AccountCallbackRaw = unsafe extern "system" fn(event: *const CAccountEvent, ctx: *mut c_void);
type SetOrderCallbackFn =
    unsafe extern "system" fn(OrderCallbackRaw, *mut c_void) -> c_int;
type SetPositionCallbackFn =
    unsafe extern "system" fn(PositionCallbackRaw, *mut c_void) -> c_int;
type SetAccountCallbackFn =
    unsafe extern "system" fn(AccountCallbackRaw, *mut c_void) -> c_int;

#[repr(C)]
struct COrderRequest {
    order_id: *const c_char,
    symbol: *const c_char,
    direction: c_int,
    offset: c_int,
    volume: c_longlong,
    has_limit_price: c_int,
    limit_price: c_double,
}

#[repr(C)]
struct COrderEvent {
    order_id: *const c_char,
    instrument_id: *const c_char,
    exchange_order_id: *const c_char,
    exchange_id: *const c_char,
    direction: c_int,
    offset: c_int,
    volume_orign: c_longlong,
    volume_left: c_longlong,
    status: c_int,
    last_msg: *const c_char,
    trade_price: c_double,
}

#[repr(C)]
struct CPositionEvent {
    symbol: *const c_char,
    pos_long_today: c_longlong,
    pos_long_his: c_longlong,
    pos_short_today: c_longlong,
    pos_short_his: c_longlong,
}

#[repr(C)]
struct CAccountEvent {
    balance: c_double,
    available: c_double,
    margin: c_double,
    risk_ratio: c_double,
    position_profit: c_double,
}

enum RawEvent {
    Order(Order),
    Position(String, FullPosition),
    Account(Account),
}

/// Global sink the `extern "system"` trampolines push into. The SDK invokes
/// callbacks from its own internal thread; there is exactly one gateway
/// instance per process, so a single static channel is sufficient.
static EVENT_TX: OnceCell<Mutex<SyncSender<RawEvent>>> = OnceCell::new();

unsafe fn cstr_to_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

fn direction_from_raw(value: c_int) -> Direction {
    if value == 1 {
        Direction::Sell
    } else {
        Direction::Buy
    }
}

fn offset_from_raw(value: c_int) -> Offset {
    match value {
        1 => Offset::Close,
        2 => Offset::Closetoday,
        _ => Offset::Open,
    }
}

extern "system" fn on_order(event: *const COrderEvent, _ctx: *mut c_void) {
    let order = unsafe {
        let event = &*event;
        Order {
            order_id: cstr_to_string(event.order_id),
            instrument_id: cstr_to_string(event.instrument_id),
            direction: direction_from_raw(event.direction),
            offset: offset_from_raw(event.offset),
            volume_orign: event.volume_orign,
            limit_price: None,
            portfolio_id: String::new(),
            origin_timestamp: 0,
            exchange_order_id: cstr_to_string(event.exchange_order_id),
            exchange_id: cstr_to_string(event.exchange_id),
            volume_left: event.volume_left,
            last_msg: cstr_to_string(event.last_msg),
            status: if event.status == 1 {
                OrderStatus::Finished
            } else {
                OrderStatus::Alive
            },
            is_dead: false,
            is_online: true,
            is_error: false,
            trade_price: Decimal::from_f64(event.trade_price).unwrap_or_default(),
            exchange_trading_date: String::new(),
            trades: Vec::new(),
        }
    };
    if let Some(tx) = EVENT_TX.get() {
        let _ = tx.lock().expect("event sink mutex poisoned").send(RawEvent::Order(order));
    }
}

extern "system" fn on_position(event: *const CPositionEvent, _ctx: *mut c_void) {
    let (symbol, position) = unsafe {
        let event = &*event;
        (
            cstr_to_string(event.symbol),
            FullPosition::new(
                event.pos_long_today,
                event.pos_long_his,
                event.pos_short_today,
                event.pos_short_his,
            ),
        )
    };
    if let Some(tx) = EVENT_TX.get() {
        let _ = tx
            .lock()
            .expect("event sink mutex poisoned")
            .send(RawEvent::Position(symbol, position));
    }
}

extern "system" fn on_account(event: *const CAccountEvent, _ctx: *mut c_void) {
    let account = unsafe {
        let event = &*event;
        Account {
            balance: Decimal::from_f64(event.balance).unwrap_or_default(),
            available: Decimal::from_f64(event.available).unwrap_or_default(),
            margin: Decimal::from_f64(event.margin).unwrap_or_default(),
            risk_ratio: Decimal::from_f64(event.risk_ratio).unwrap_or_default(),
            position_profit: Decimal::from_f64(event.position_profit).unwrap_or_default(),
        }
    };
    if let Some(tx) = EVENT_TX.get() {
        let _ = tx.lock().expect("event sink mutex poisoned").send(RawEvent::Account(account));
    }
}

/// Owns the loaded library and the live dictionaries it mutates. `Library`
/// must outlive every `Symbol` pulled from it, so it's kept alongside them
/// for the gateway's whole lifetime.
pub struct RealGateway {
    _library: Library,
    send_order: Symbol<'static, SendOrderFn>,
    send_cancel: Symbol<'static, SendCancelFn>,
    finalize: Symbol<'static, FinalizeFn>,
    rx: Receiver<RawEvent>,
    orders: HashMap<String, Order>,
    positions: HashMap<String, FullPosition>,
    account: Account,
}

impl RealGateway {
    pub fn connect(creds: &Credentials) -> Result<Self, BrokerError> {
        let path = std::env::var(LIBRARY_ENV).unwrap_or_else(|_| DEFAULT_LIBRARY_NAME.to_string());
        let library = unsafe { Library::new(&path) }
            .map_err(|e| BrokerError::Load(format!("{path}: {e}")))?;

        let (tx, rx) = sync_channel(4096);
        EVENT_TX
            .set(Mutex::new(tx))
            .map_err(|_| BrokerError::ConnectionFailed("gateway already initialized".into()))?;

        unsafe {
            let initialize_login: Symbol<InitializeLoginFn> = library
                .get(b"InitializeLogin\0")
                .map_err(|_| BrokerError::MissingSymbol("InitializeLogin"))?;
            let set_order_cb: Symbol<SetOrderCallbackFn> = library
                .get(b"SetOrderCallback\0")
                .map_err(|_| BrokerError::MissingSymbol("SetOrderCallback"))?;
            let set_position_cb: Symbol<SetPositionCallbackFn> = library
                .get(b"SetPositionCallback\0")
                .map_err(|_| BrokerError::MissingSymbol("SetPositionCallback"))?;
            let set_account_cb: Symbol<SetAccountCallbackFn> = library
                .get(b"SetAccountCallback\0")
                .map_err(|_| BrokerError::MissingSymbol("SetAccountCallback"))?;

            let user = CString::new(creds.username.clone()).unwrap_or_default();
            let pass = CString::new(creds.password.clone()).unwrap_or_default();
            let key = CString::new(creds.activation_key.clone()).unwrap_or_default();
            let result = initialize_login(user.as_ptr(), pass.as_ptr(), key.as_ptr());
            if result != 0 {
                return Err(BrokerError::ConnectionFailed(format!(
                    "InitializeLogin returned {result}"
                )));
            }

            set_order_cb(on_order, std::ptr::null_mut());
            set_position_cb(on_position, std::ptr::null_mut());
            set_account_cb(on_account, std::ptr::null_mut());

            let send_order: Symbol<SendOrderFn> = library
                .get(b"SendOrder\0")
                .map_err(|_| BrokerError::MissingSymbol("SendOrder"))?;
            let send_cancel: Symbol<SendCancelFn> = library
                .get(b"SendCancelOrder\0")
                .map_err(|_| BrokerError::MissingSymbol("SendCancelOrder"))?;
            let finalize: Symbol<FinalizeFn> = library
                .get(b"Finalize\0")
                .map_err(|_| BrokerError::MissingSymbol("Finalize"))?;

            // Extend symbol lifetimes to 'static: sound because `_library`
            // is kept alive for as long as `Self` exists and is never
            // unloaded before these symbols are dropped.
            let send_order: Symbol<'static, SendOrderFn> = std::mem::transmute(send_order);
            let send_cancel: Symbol<'static, SendCancelFn> = std::mem::transmute(send_cancel);
            let finalize: Symbol<'static, FinalizeFn> = std::mem::transmute(finalize);

            Ok(Self {
                _library: library,
                send_order,
                send_cancel,
                finalize,
                rx,
                orders: HashMap::new(),
                positions: HashMap::new(),
                account: Account::default(),
            })
        }
    }
}

impl BrokerGateway for RealGateway {
    fn drain(&mut self, deadline: Duration) -> Result<DrainOutcome, BrokerError> {
        match self.rx.recv_timeout(deadline) {
            Ok(event) => {
                self.apply(event);
                while let Ok(more) = self.rx.try_recv() {
                    self.apply(more);
                }
                Ok(DrainOutcome {
                    observed_event: true,
                })
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => Ok(DrainOutcome {
                observed_event: false,
            }),
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => Err(BrokerError::NotInitialized),
        }
    }

    fn orders(&self) -> &HashMap<String, Order> {
        &self.orders
    }

    fn positions(&self) -> &HashMap<String, FullPosition> {
        &self.positions
    }

    fn account(&self) -> &Account {
        &self.account
    }

    fn insert_order(
        &mut self,
        order_id: &str,
        symbol: &str,
        direction: Direction,
        offset: Offset,
        volume: i64,
        limit_price: Option<Decimal>,
    ) -> Result<(), BrokerError> {
        let order_id_c = CString::new(order_id).unwrap_or_default();
        let symbol_c = CString::new(symbol).unwrap_or_default();
        let request = COrderRequest {
            order_id: order_id_c.as_ptr(),
            symbol: symbol_c.as_ptr(),
            direction: if direction == Direction::Sell { 1 } else { 0 },
            offset: match offset {
                Offset::Open => 0,
                Offset::Close => 1,
                Offset::Closetoday => 2,
            },
            volume,
            has_limit_price: limit_price.is_some() as c_int,
            limit_price: limit_price
                .and_then(|p| rust_decimal::prelude::ToPrimitive::to_f64(&p))
                .unwrap_or_default(),
        };
        let result = unsafe { (self.send_order)(&request) };
        if result != 0 {
            return Err(BrokerError::OrderRejected(format!(
                "SendOrder returned {result}"
            )));
        }
        Ok(())
    }

    fn cancel_order(&mut self, order_id: &str) -> Result<(), BrokerError> {
        let order_id_c = CString::new(order_id).unwrap_or_default();
        let result = unsafe { (self.send_cancel)(order_id_c.as_ptr()) };
        if result != 0 {
            return Err(BrokerError::OrderRejected(format!(
                "SendCancelOrder returned {result}"
            )));
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        unsafe {
            (self.finalize)();
        }
    }
}

impl RealGateway {
    fn apply(&mut self, event: RawEvent) {
        match event {
            RawEvent::Order(order) => {
                self.orders.insert(order.order_id.clone(), order);
            }
            RawEvent::Position(symbol, position) => {
                self.positions.insert(symbol, position);
            }
            RawEvent::Account(account) => {
                self.account = account;
            }
        }
    }
}

impl Drop for RealGateway {
    fn drop(&mut self) {
        self.shutdown();
    }
}
