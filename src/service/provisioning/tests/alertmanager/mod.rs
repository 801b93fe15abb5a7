use super::*;

use crate::model::alertmanager::SaveAlertmanagerConfigurationCmd;


fn save_cmd(
    configuration: &str,
    expected_version: Option<i64>,
) -> SaveAlertmanagerConfigurationCmd {
    SaveAlertmanagerConfigurationCmd {
        org_id: 1,
        configuration: configuration.to_string(),
        is_default: false,
        expected_version,
    }
}
