// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// iOS platform bridge via objc2.
//
// Requires compilation with the iOS SDK (Xcode) and the RedotPay SDK framework
// linked into the app. The SDK is reached through its Objective-C surface:
//
// - `+[RedotPayPaymentController setTestMode:]` / `+setLanguage:` carry the
//   process-wide environment.
// - `-[RedotPayPaymentController initWithPreSn:publicKey:jwtToken:]` builds
//   the payment sheet (a `UIViewController`).
// - `-setDismissDelegate:` takes an object answering
//   `paymentModuleDidDismiss:` / `paymentModuleDidFinish:`; the SDK holds it
//   weakly, so the sheet handle keeps it alive.
//
// The class name comes from `BridgeConfig::sdk_class`.
//
// ## Unsafe code
//
// 1. **ObjC message sends** (msg_send!, define_class! #[unsafe(...)]):
//    required by the objc2 runtime. UIKit selectors are only sent while a
//    `MainThreadMarker` is held.
// 2. **libdispatch / CoreText C FFI**: `dispatch_async_f` onto the main
//    queue and `CTFontManagerRegisterFontsForURL` with a toll-free bridged
//    NSURL.
// 3. **`MainThreadCell`**: lets the sheet handle cross into the session
//    controller; its contents are only touched on the main thread.

#![cfg(target_os = "ios")]

use std::ffi::{CString, c_void};
use std::sync::Arc;

use objc2::rc::{Allocated, Retained};
use objc2::runtime::{AnyClass, AnyObject, NSObject};
use objc2::{MainThreadMarker, MainThreadOnly, define_class, msg_send};
use objc2_foundation::{NSArray, NSBundle, NSSet, NSString, NSURL};
use objc2_ui_kit::{UIApplication, UIModalPresentationStyle, UIViewController};

use redotpay_core::config::BridgeConfig;
use redotpay_core::environment::EnvironmentSnapshot;
use redotpay_core::error::{PayBridgeError, Result};
use redotpay_core::types::DismissReason;

use crate::session::DismissSignal;
use crate::traits::*;

// ---------------------------------------------------------------------------
// libdispatch FFI (main queue)
// ---------------------------------------------------------------------------
// `dispatch_get_main_queue()` is a header macro for `&_dispatch_main_q`.

#[repr(C)]
struct DispatchQueue {
    _private: [u8; 0],
}

unsafe extern "C" {
    static _dispatch_main_q: DispatchQueue;
    fn dispatch_async_f(
        queue: *const DispatchQueue,
        context: *mut c_void,
        work: extern "C" fn(*mut c_void),
    );
}

// ---------------------------------------------------------------------------
// CoreText FFI (font registration)
// ---------------------------------------------------------------------------

/// `kCTFontManagerScopeProcess`: fonts live until the process exits.
const CT_FONT_MANAGER_SCOPE_PROCESS: u32 = 1;

/// Font file extensions shipped in the SDK bundle.
const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

#[link(name = "CoreText", kind = "framework")]
unsafe extern "C" {
    fn CTFontManagerRegisterFontsForURL(
        font_url: *const c_void,
        scope: u32,
        error: *mut *const c_void,
    ) -> bool;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Assert that we are on the main thread and return the marker.
fn require_main_thread() -> Result<MainThreadMarker> {
    MainThreadMarker::new()
        .ok_or_else(|| PayBridgeError::Bridge("must be called from the main thread".into()))
}

/// Holds UIKit objects that must only be used on the main thread.
struct MainThreadCell<T>(T);

// SAFETY: the contents are only reachable through `get`, which demands a
// MainThreadMarker. The session controller drops sheets from the main
// context, so release also happens on the main thread.
unsafe impl<T> Send for MainThreadCell<T> {}

impl<T> MainThreadCell<T> {
    fn get(&self, _mtm: MainThreadMarker) -> &T {
        &self.0
    }
}

/// The root view controller of the first foreground window scene.
///
/// Walks `connectedScenes` instead of the deprecated `keyWindow`, since apps
/// adopting scenes have no key window during launch.
fn root_view_controller(mtm: MainThreadMarker) -> Option<Retained<UIViewController>> {
    let app = UIApplication::sharedApplication(mtm);

    // SAFETY: msg_send! to well-known UIApplication / UIWindowScene / UIWindow
    // selectors (connectedScenes, allObjects, isKindOfClass:, windows,
    // rootViewController). MainThreadMarker guarantees main-thread execution.
    unsafe {
        let scenes: Retained<NSSet<AnyObject>> = msg_send![&app, connectedScenes];
        let scenes: Retained<NSArray<AnyObject>> = msg_send![&scenes, allObjects];
        let window_scene_class = objc2::class!(UIWindowScene);

        for i in 0..scenes.count() {
            let scene = scenes.objectAtIndex(i);
            let is_window_scene: bool = msg_send![&scene, isKindOfClass: window_scene_class];
            if !is_window_scene {
                continue;
            }
            let windows: Retained<NSArray<AnyObject>> = msg_send![&scene, windows];
            let Some(window) = windows.firstObject() else {
                continue;
            };
            let root: Option<Retained<UIViewController>> = msg_send![&window, rootViewController];
            if root.is_some() {
                return root;
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Main queue
// ---------------------------------------------------------------------------

/// `MainContext` backed by the GCD main queue.
pub struct MainDispatch;

extern "C" fn run_main_job(context: *mut c_void) {
    // SAFETY: `context` came from Box::into_raw in `run_on_main` and GCD
    // invokes each work item exactly once.
    let job = unsafe { Box::from_raw(context as *mut MainJob) };
    job();
}

impl MainContext for MainDispatch {
    fn run_on_main(&self, job: MainJob) {
        let context = Box::into_raw(Box::new(job)) as *mut c_void;
        // SAFETY: `_dispatch_main_q` is the process main queue object;
        // dispatch_async_f copies nothing but the pointer and calls
        // `run_main_job` with it once.
        unsafe {
            dispatch_async_f(&raw const _dispatch_main_q, context, run_main_job);
        }
    }
}

// ---------------------------------------------------------------------------
// Dismiss delegate
// ---------------------------------------------------------------------------

struct DismissDelegateIvars {
    /// Single-fire; both selectors feed the same signal.
    signal: DismissSignal,
}

// SAFETY: define_class! #[unsafe(super(NSObject))] declares DismissDelegate
// as an ObjC class inheriting from NSObject. MainThreadOnly matches the SDK,
// which calls its delegate from the main thread.
define_class! {
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "RedotPayBridgeDismissDelegate"]
    #[ivars = DismissDelegateIvars]
    struct DismissDelegate;

    impl DismissDelegate {
        /// User closed the sheet.
        #[unsafe(method(paymentModuleDidDismiss:))]
        fn did_dismiss(&self, _controller: &AnyObject) {
            self.ivars().signal.fire(DismissReason::UserClosed);
        }

        /// Payment flow ended inside the SDK.
        #[unsafe(method(paymentModuleDidFinish:))]
        fn did_finish(&self, _controller: &AnyObject) {
            self.ivars().signal.fire(DismissReason::FlowCompleted);
        }
    }
}

impl DismissDelegate {
    fn new(mtm: MainThreadMarker, signal: DismissSignal) -> Retained<Self> {
        let this = Self::alloc(mtm);
        let this = this.set_ivars(DismissDelegateIvars { signal });
        // SAFETY: Standard NSObject init via super.
        unsafe { msg_send![super(this), init] }
    }
}

// ---------------------------------------------------------------------------
// IosPlatform
// ---------------------------------------------------------------------------

/// Concrete iOS payment platform.
///
/// Everything except the module probe and the preload expects the main
/// thread; the orchestrator only calls in from the main queue.
pub struct IosPlatform {
    /// `None` if the configured class name cannot be a C string.
    sdk_class: Option<CString>,
    main: Arc<MainDispatch>,
}

impl IosPlatform {
    pub fn new(config: &BridgeConfig) -> Self {
        let sdk_class = CString::new(config.sdk_class.as_str()).ok();
        if sdk_class.is_none() {
            tracing::error!(class = %config.sdk_class, "invalid SDK class name");
        }
        Self {
            sdk_class,
            main: Arc::new(MainDispatch),
        }
    }

    fn sdk_class(&self) -> Option<&'static AnyClass> {
        self.sdk_class.as_deref().and_then(AnyClass::get)
    }

    fn require_sdk_class(&self) -> Result<&'static AnyClass> {
        self.sdk_class().ok_or(PayBridgeError::ModuleNotLoaded)
    }
}

impl PaymentPlatform for IosPlatform {
    fn platform_name(&self) -> &str {
        "iOS"
    }

    fn main_context(&self) -> Arc<dyn MainContext> {
        self.main.clone()
    }
}

impl NativeModuleProbe for IosPlatform {
    fn is_module_loaded(&self) -> bool {
        self.sdk_class().is_some()
    }
}

// ---------------------------------------------------------------------------
// ResourcePreloader -- CoreText font registration
// ---------------------------------------------------------------------------

impl ResourcePreloader for IosPlatform {
    /// Register every font file in the SDK's bundle for this process.
    ///
    /// NSBundle lookups and CoreText registration are thread-safe, so this
    /// runs on the background preload thread.
    fn preload_resources(&self) -> Result<()> {
        let class = self.require_sdk_class()?;
        let bundle = NSBundle::bundleForClass(class);

        let mut registered = 0usize;
        for ext in FONT_EXTENSIONS {
            let ns_ext = NSString::from_str(ext);
            // SAFETY: pathsForResourcesOfType:inDirectory: is a documented
            // NSBundle selector; nil directory searches the bundle root.
            let paths: Retained<NSArray<NSString>> = unsafe {
                msg_send![&bundle, pathsForResourcesOfType: &*ns_ext, inDirectory: None::<&NSString>]
            };
            for i in 0..paths.count() {
                let path = paths.objectAtIndex(i);
                let url = NSURL::fileURLWithPath(&path);
                // SAFETY: NSURL is toll-free bridged with CFURL. A null error
                // out-pointer tells CoreText not to create an error object.
                let ok = unsafe {
                    CTFontManagerRegisterFontsForURL(
                        &*url as *const NSURL as *const c_void,
                        CT_FONT_MANAGER_SCOPE_PROCESS,
                        std::ptr::null_mut(),
                    )
                };
                if ok {
                    registered += 1;
                } else {
                    // Usually already registered by an earlier launch.
                    tracing::debug!(path = %path, "font not registered");
                }
            }
        }

        tracing::debug!(registered, "iOS: SDK fonts preloaded");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EnvironmentSink -- SDK class properties
// ---------------------------------------------------------------------------

impl EnvironmentSink for IosPlatform {
    fn apply_environment(&self, env: &EnvironmentSnapshot) -> Result<()> {
        let _mtm = require_main_thread()?;
        let class = self.require_sdk_class()?;
        let language = NSString::from_str(&env.language);

        // SAFETY: class methods exported by the SDK for its global
        // configuration; called on the main thread where its UI reads them.
        unsafe {
            let _: () = msg_send![class, setTestMode: env.is_test];
            let _: () = msg_send![class, setLanguage: &*language];
        }
        tracing::debug!(is_test = env.is_test, language = %env.language, "iOS: environment applied");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PresentationHostResolver -- connected window scenes
// ---------------------------------------------------------------------------

impl PresentationHostResolver for IosPlatform {
    fn resolve_host(&self) -> Option<Box<dyn PresentationHost>> {
        let Some(mtm) = MainThreadMarker::new() else {
            tracing::warn!("iOS: host lookup off the main thread");
            return None;
        };
        let class = self.sdk_class()?;
        let root = root_view_controller(mtm)?;
        Some(Box::new(IosHost { root, class, mtm }))
    }
}

/// Root view controller of the foreground window.
struct IosHost {
    root: Retained<UIViewController>,
    class: &'static AnyClass,
    mtm: MainThreadMarker,
}

impl PresentationHost for IosHost {
    fn describe(&self) -> String {
        self.root.class().name().to_string_lossy().into_owned()
    }

    /// Build the SDK's payment controller and present it full-screen over
    /// the root view controller.
    ///
    /// # Errors
    ///
    /// `StartPayFailed` if the SDK refuses to build its controller.
    fn present_payment(
        self: Box<Self>,
        request: &PresentationRequest<'_>,
        on_dismiss: DismissSignal,
    ) -> Result<Box<dyn PresentedSheet>> {
        let mtm = self.mtm;
        let pre_sn = NSString::from_str(request.pre_order_id);
        let public_key = NSString::from_str(request.public_key);
        let jwt_token = NSString::from_str(request.jwt_token);

        // SAFETY: ObjC alloc+init on the SDK's controller class, whose
        // designated initializer takes three NSString arguments and returns a
        // UIViewController subclass (or nil on refusal).
        let controller: Option<Retained<UIViewController>> = unsafe {
            let alloc: Allocated<UIViewController> = msg_send![self.class, alloc];
            msg_send![
                alloc,
                initWithPreSn: &*pre_sn,
                publicKey: &*public_key,
                jwtToken: &*jwt_token
            ]
        };
        let controller = controller.ok_or_else(|| {
            PayBridgeError::StartPayFailed("SDK refused to create the payment controller".into())
        })?;

        let delegate = DismissDelegate::new(mtm, on_dismiss);

        tracing::info!(host = %self.describe(), "iOS: presenting payment controller");

        // SAFETY: setDismissDelegate: is the SDK's delegate setter; the
        // delegate is an NSObject subclass and stays retained by IosSheet.
        // modalPresentationStyle and presentViewController are UIKit methods
        // called on the main thread (MainThreadMarker held by IosHost).
        unsafe {
            let _: () = msg_send![&controller, setDismissDelegate: &*delegate];
            controller.setModalPresentationStyle(UIModalPresentationStyle::FullScreen);
            self.root
                .presentViewController_animated_completion(&controller, request.animated, None);
        }

        Ok(Box::new(IosSheet {
            controller: MainThreadCell(controller),
            _delegate: MainThreadCell(delegate),
        }))
    }
}

/// The presented payment controller.
struct IosSheet {
    controller: MainThreadCell<Retained<UIViewController>>,
    _delegate: MainThreadCell<Retained<DismissDelegate>>,
}

impl PresentedSheet for IosSheet {
    fn dismiss(self: Box<Self>, animated: bool) {
        let Some(mtm) = MainThreadMarker::new() else {
            tracing::error!("iOS: payment sheet dismissal off the main thread, leaving it up");
            return;
        };
        // SAFETY: dismissViewControllerAnimated:completion: is a standard
        // UIViewController method, called on the main thread.
        unsafe {
            self.controller
                .get(mtm)
                .dismissViewControllerAnimated_completion(animated, None);
        }
        tracing::info!("iOS: payment controller dismissed");
    }
}
