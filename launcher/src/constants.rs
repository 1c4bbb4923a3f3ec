// Constants for the Guacamole desktop launcher
//
// Defaults for everything the config file can override, plus the fixed
// strings served by the redirect listener.

// ============================================================================
// Remote Gateway
// ============================================================================

/// Login page loaded when the window opens
pub const DEFAULT_LOGIN_URL: &str = "https://desktop.rc.nectar.org.au/";

/// Client deep link; `{token}` is replaced with the session token
pub const DEFAULT_CLIENT_URL_TEMPLATE: &str =
    "https://desktop-qriscloud.rc.nectar.org.au/#/client/{token}";

/// Placeholder in the client URL template
pub const TOKEN_PLACEHOLDER: &str = "{token}";

// ============================================================================
// Redirect Listener
// ============================================================================

/// Port the authentication flow redirects to
pub const DEFAULT_REDIRECT_PORT: u16 = 34567;

/// Query parameter carrying the session token
pub const TOKEN_PARAM: &str = "token";

/// Body served once a token has been received
pub const LAUNCHING_BODY: &str =
    "<html><body><h2>Launching Guacamole in app window...</h2></body></html>";

/// Body served to requests without a token
pub const WAITING_BODY: &str =
    "<html><body>Waiting for Guacamole session token...</body></html>";

// ============================================================================
// Local State
// ============================================================================

/// Directory name under the user cache directory
pub const CACHE_DIR_NAME: &str = "guac-webkit";

/// Recovery file name inside the cache directory
pub const RECOVERY_FILE_NAME: &str = "gnome-keybindings.json";

/// Directory name under the user config directory
pub const CONFIG_DIR_NAME: &str = "guacview";

/// Settings store command-line tool
pub const DEFAULT_GSETTINGS_PROGRAM: &str = "gsettings";

// ============================================================================
// Window
// ============================================================================

/// Window title reported by the display surface
pub const WINDOW_TITLE: &str = "Guacamole Desktop";
