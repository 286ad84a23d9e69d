use colored::*;
use std::time::{Duration, Instant};

/// Counters for a single probe run.
#[derive(Debug)]
pub struct ProbeStats {
    login_attempts: u64,
    password_attempts: u64,
    partial_matches: u64,
    backoffs: u64,
    start_time: Instant,
}

impl ProbeStats {
    pub fn new() -> Self {
        Self {
            login_attempts: 0,
            password_attempts: 0,
            partial_matches: 0,
            backoffs: 0,
            start_time: Instant::now(),
        }
    }

    pub fn record_login_attempt(&mut self) {
        self.login_attempts += 1;
    }

    pub fn record_password_attempt(&mut self) {
        self.password_attempts += 1;
    }

    pub fn record_partial_match(&mut self) {
        self.partial_matches += 1;
    }

    pub fn set_backoffs(&mut self, backoffs: u64) {
        self.backoffs = backoffs;
    }

    pub fn login_attempts(&self) -> u64 {
        self.login_attempts
    }

    pub fn password_attempts(&self) -> u64 {
        self.password_attempts
    }

    pub fn partial_matches(&self) -> u64 {
        self.partial_matches
    }

    pub fn total_attempts(&self) -> u64 {
        self.login_attempts + self.password_attempts
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn print_final(&self) {
        println!();
        let total = self.total_attempts();
        let elapsed = self.elapsed().as_secs_f64();

        println!("{}", "=== Statistics ===".bold());
        println!("  Login attempts:    {}", self.login_attempts);
        println!("  Password attempts: {}", self.password_attempts);
        println!("  Partial matches:   {}", self.partial_matches.to_string().green().bold());
        println!("  Slow-reply pauses: {}", self.backoffs.to_string().yellow());
        println!("  Elapsed time:      {:.2}s", elapsed);
        if elapsed > 0.0 {
            println!("  Average rate:      {:.1} attempts/s", total as f64 / elapsed);
        }
    }
}

impl Default for ProbeStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut stats = ProbeStats::new();
        stats.record_login_attempt();
        stats.record_login_attempt();
        stats.record_password_attempt();
        stats.record_partial_match();
        assert_eq!(stats.login_attempts(), 2);
        assert_eq!(stats.password_attempts(), 1);
        assert_eq!(stats.partial_matches(), 1);
        assert_eq!(stats.total_attempts(), 3);
    }
}
