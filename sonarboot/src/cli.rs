use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sonarboot")]
#[command(
    about = "One-shot SonarQube bootstrap for CI pipelines: downloads analyzer plugins, provisions a quality profile and a service account, and injects the issued API token into the Jenkins SonarQube plugin configuration."
)]
#[command(version)]
pub struct Args {
    /// Enable debug mode for detailed output
    #[arg(
        long = "debug",
        short = 'd',
        help = "Enable debug mode for detailed diagnostic output"
    )]
    pub debug: bool,

    /// Directory the analyzer plugin archives are downloaded into
    #[arg(
        long = "plugin-dir",
        help = "Directory the analyzer plugin archives are downloaded into",
        default_value = "/opt/data/sonar"
    )]
    pub plugin_dir: PathBuf,

    /// Jenkins data directory holding the SonarQube plugin configuration
    #[arg(
        long = "jenkins-dir",
        help = "Jenkins data directory holding hudson.plugins.sonar.SonarGlobalConfiguration.xml",
        default_value = "/opt/data/jenkins"
    )]
    pub jenkins_dir: PathBuf,

    /// Quality profile backup to restore before configuring the profile
    #[arg(
        long = "profile-backup",
        help = "Path to a quality profile backup XML to restore before profile configuration"
    )]
    pub profile_backup: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["sonarboot"]).unwrap();

        assert!(!args.debug);
        assert_eq!(args.plugin_dir, PathBuf::from("/opt/data/sonar"));
        assert_eq!(args.jenkins_dir, PathBuf::from("/opt/data/jenkins"));
        assert!(args.profile_backup.is_none());
    }

    #[test]
    fn test_path_overrides() {
        let args = Args::try_parse_from([
            "sonarboot",
            "--debug",
            "--plugin-dir",
            "/tmp/plugins",
            "--jenkins-dir",
            "/tmp/jenkins",
            "--profile-backup",
            "/tmp/backup.xml",
        ])
        .unwrap();

        assert!(args.debug);
        assert_eq!(args.plugin_dir, PathBuf::from("/tmp/plugins"));
        assert_eq!(args.jenkins_dir, PathBuf::from("/tmp/jenkins"));
        assert_eq!(args.profile_backup, Some(PathBuf::from("/tmp/backup.xml")));
    }
}
