/// Lua script for fixed-window counting in Redis
///
/// Increments the window counter and stamps the TTL in one atomic script so
/// two concurrent requests for the same key can never lose an update or race
/// the expiry.
///
/// KEYS[1] = the window key
/// ARGV[1] = window duration (seconds)
///
/// Returns: [count after increment, seconds until the window resets]
pub const FIXED_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local window = tonumber(ARGV[1])

local current = redis.call('INCR', key)

-- Stamp the expiry when the window is created
if current == 1 then
    redis.call('EXPIRE', key, window)
end

local ttl = redis.call('TTL', key)
if ttl == -1 then
    -- Key exists without an expiry (e.g. a partial write); repair it
    redis.call('EXPIRE', key, window)
    ttl = window
end

return {current, math.max(1, ttl)}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_is_valid() {
        assert!(FIXED_WINDOW_SCRIPT.contains("INCR"));
        assert!(FIXED_WINDOW_SCRIPT.contains("EXPIRE"));
        assert!(FIXED_WINDOW_SCRIPT.contains("TTL"));
    }
}
