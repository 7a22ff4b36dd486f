pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const LINK: &str = "📡";
    pub const STATS: &str = "📊";
    pub const FILE: &str = "📄";
    pub const DEL: &str = "🗑️";
    pub const DATABASE: &str = "🗄️";
    pub const MONEY: &str = "💰";
    pub const FILTER: &str = "🔎";
    pub const GEAR: &str = "⚙️";
}
