//! The full rule set over a small multi-file service.

use std::collections::BTreeSet;

use dsm_lint::error::exit_code;
use dsm_lint::lint::{LintConfig, LintEngine, LintReport, RuleCode};

const INTERFACES: &str = r#"
namespace Demoulas.ProfitSharing.Common.Interfaces;

public interface IIsExecutive
{
    bool IsExecutive { get; }
}

public interface INameParts
{
    string FirstName { get; }
    string LastName { get; }
}
"#;

const MEMBER_REQUEST: &str = r#"
namespace Demoulas.ProfitSharing.Common.Contracts.Request;

public sealed record MemberRequest
{
    public int BadgeNumber { get; init; }

    public static MemberRequest RequestExample() => new() { BadgeNumber = 700123 };
}
"#;

const MEMBER_RESPONSE: &str = r#"
using Demoulas.ProfitSharing.Common.Interfaces;

namespace Demoulas.ProfitSharing.Common.Contracts.Response;

public sealed record MemberDetailsResponse : IIsExecutive, INameParts
{
    public string Ssn { get; init; } = string.Empty;
    public string FirstName { get; init; } = string.Empty;
    public string LastName { get; init; } = string.Empty;
    public int BadgeNumber { get; init; }
    [MaskSensitive] public int Age { get; init; }
    public bool IsExecutive { get; init; }

    public static MemberDetailsResponse ResponseExample() =>
        new() { Ssn = "XXX-XX-6789", FirstName = "Jane", LastName = "Doe", BadgeNumber = 700123 };
}
"#;

const TOTALS_RESPONSE: &str = r#"
namespace Demoulas.ProfitSharing.Common.Contracts.Response;

public class PayrollTotalsResponse
{
    public decimal Total { get; set; }
}
"#;

const YEAR_END_ROW: &str = r#"
namespace Demoulas.ProfitSharing.Common.Contracts.Response;

public sealed class EmployeeYearEndRow
{
    [MaskSensitive] public int BadgeNumber { get; set; }
    public DateOnly DateOfBirth { get; set; }
    public string? PhoneNumber { get; set; }
}
"#;

const CONTACT_RESPONSE: &str = r#"
namespace Demoulas.ProfitSharing.Common.Contracts.Response;

public class BeneficiaryContactResponse
{
    public string City { get; set; } = string.Empty;
    public string Email { get; set; } = string.Empty;
}
"#;

const ENDPOINTS: &str = r#"
using Demoulas.ProfitSharing.Common.Contracts.Request;
using Demoulas.ProfitSharing.Common.Contracts.Response;

namespace Demoulas.ProfitSharing.Endpoints.Members;

public sealed class GetMemberEndpoint : ProfitSharingEndpoint<MemberRequest, MemberDetailsResponse>
{
}

public sealed class GetTotalsEndpoint : ProfitSharingEndpoint<MemberRequest, PayrollTotalsResponse>
{
}
"#;

const SERVICE: &str = r#"
using Demoulas.ProfitSharing.Common.Contracts.Response;

namespace Demoulas.ProfitSharing.Services;

public sealed class MemberService
{
    public MemberDetailsResponse Map(Demographic d)
    {
        var response = new MemberDetailsResponse { Ssn = d.Ssn, FirstName = d.FirstName, LastName = d.LastName };
        return response with { Ssn = d.Ssn.MaskSsn() };
    }

    public decimal Vested(decimal amount) => Math.Round(amount * 0.2m, 2);

    public decimal VestedRounded(decimal amount) => Math.Round(amount * 0.2m, 2, MidpointRounding.AwayFromZero);

    public Dictionary<string, Demographic> Index(List<Demographic> rows) => rows.ToDictionary(r => r.Ssn);

    public Dictionary<int, Demographic> ByBadge(List<Demographic> rows) => rows.ToDictionary(r => r.BadgeNumber);

    public string Display(Demographic d) => d.FullName ?? $"{d.LastName}, {d.FirstName}";

    public bool IsHardship(ProfitDetail p) => p.CommentType?.Name == "Hardship";

    public bool IsHardshipById(ProfitDetail p) => p.CommentType?.Id == CommentType.Constants.Hardship.Id;

    public int Count(ProfitSharingDbContext ctx) => ctx.Demographics.Count();
}
"#;

fn project() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Common/Interfaces/IIsExecutive.cs", INTERFACES),
        ("Common/Contracts/Request/MemberRequest.cs", MEMBER_REQUEST),
        ("Common/Contracts/Response/MemberDetailsResponse.cs", MEMBER_RESPONSE),
        ("Common/Contracts/Response/PayrollTotalsResponse.cs", TOTALS_RESPONSE),
        ("Common/Contracts/Response/EmployeeYearEndRow.cs", YEAR_END_ROW),
        ("Common/Contracts/Response/BeneficiaryContactResponse.cs", CONTACT_RESPONSE),
        ("Endpoints/Members/GetMemberEndpoint.cs", ENDPOINTS),
        ("Services/MemberService.cs", SERVICE),
    ]
}

fn run(config: LintConfig) -> LintReport {
    LintEngine::new(config)
        .expect("engine builds")
        .check_sources(project())
        .expect("sources parse")
}

/// `(file name, rule)` pairs of a report.
fn findings(report: &LintReport) -> BTreeSet<(String, RuleCode)> {
    report
        .diagnostics
        .iter()
        .map(|d| {
            let name = d
                .file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (name, d.rule)
        })
        .collect()
}

fn expect(pairs: &[(&str, RuleCode)]) -> BTreeSet<(String, RuleCode)> {
    pairs.iter().map(|(f, r)| (f.to_string(), *r)).collect()
}

#[test]
fn every_rule_fires_where_expected() {
    let report = run(LintConfig::default());
    assert_eq!(report.files_checked, 8);

    let expected = expect(&[
        ("GetMemberEndpoint.cs", RuleCode::DSM007),
        ("GetMemberEndpoint.cs", RuleCode::DSM013),
        ("EmployeeYearEndRow.cs", RuleCode::DSM002),
        ("EmployeeYearEndRow.cs", RuleCode::DSM003),
        ("BeneficiaryContactResponse.cs", RuleCode::DSM005),
        ("BeneficiaryContactResponse.cs", RuleCode::DSM006),
        ("MemberService.cs", RuleCode::DSM001),
        ("MemberService.cs", RuleCode::DSM004),
        ("MemberService.cs", RuleCode::DSM008),
        ("MemberService.cs", RuleCode::DSM009),
        ("MemberService.cs", RuleCode::DSM010),
        ("MemberService.cs", RuleCode::DSMPS001),
    ]);
    assert_eq!(findings(&report), expected, "got: {:#?}", report.diagnostics);
    // One finding per offending site.
    assert_eq!(report.diagnostics.len(), expected.len());
    assert_eq!(report.exit_code(false), exit_code::LINT_ISSUES);
}

#[test]
fn endpoint_findings_point_at_the_offending_endpoint() {
    let report = run(LintConfig::new(Some("DSM007,DSM013".into()), None));
    assert_eq!(report.diagnostics.len(), 2);
    for diag in &report.diagnostics {
        assert_eq!(diag.range.start_line, 11, "{:?}", diag);
        assert_eq!(diag.args[0], "PayrollTotalsResponse");
    }
}

#[test]
fn masked_assignment_reports_the_initializer_entry() {
    let report = run(LintConfig::new(Some("DSM001".into()), None));
    assert_eq!(report.diagnostics.len(), 1);
    let diag = &report.diagnostics[0];
    assert_eq!(diag.range.start_line, 10);
    assert_eq!(diag.args, vec!["MemberDetailsResponse"]);
}

#[test]
fn security_rules_only() {
    let report = run(LintConfig::new(Some("DSM001,DSM002,DSM003,DSM007".into()), None));
    let rules: BTreeSet<RuleCode> = report.diagnostics.iter().map(|d| d.rule).collect();
    assert_eq!(
        rules,
        [RuleCode::DSM001, RuleCode::DSM002, RuleCode::DSM003, RuleCode::DSM007]
            .into_iter()
            .collect()
    );
}

#[test]
fn ignored_rules_leave_the_rest_untouched() {
    let all = run(LintConfig::default());
    let report = run(LintConfig::new(None, Some("DSM005,DSM006,DSMPS001".into())));
    assert_eq!(report.diagnostics.len(), all.diagnostics.len() - 3);
    assert!(report
        .diagnostics
        .iter()
        .all(|d| !matches!(d.rule, RuleCode::DSM005 | RuleCode::DSM006 | RuleCode::DSMPS001)));
}

#[test]
fn marker_missing_from_the_compilation_disables_the_executive_check() {
    let sources = [
        ("Endpoints/Members/GetMemberEndpoint.cs", ENDPOINTS),
        ("Common/Contracts/Response/PayrollTotalsResponse.cs", TOTALS_RESPONSE),
    ];
    let report = LintEngine::new(LintConfig::new(Some("DSM007".into()), None))
        .unwrap()
        .check_sources(sources)
        .unwrap();
    assert!(report.diagnostics.is_empty(), "got: {:?}", report.diagnostics);
}

#[test]
fn diagnostics_are_ordered_by_file_then_position() {
    let report = run(LintConfig::default());
    let keys: Vec<_> = report
        .diagnostics
        .iter()
        .map(|d| (d.file.clone(), d.range.start_line, d.range.start_col))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn running_twice_gives_identical_output() {
    let engine = LintEngine::new(LintConfig::default()).expect("engine builds");
    let key = |report: &LintReport| -> Vec<_> {
        report
            .diagnostics
            .iter()
            .map(|d| (d.rule, d.file.clone(), d.range, d.message.clone(), d.args.clone()))
            .collect()
    };
    let first = engine.check_sources(project()).expect("sources parse");
    let second = engine.check_sources(project()).expect("sources parse");
    assert!(!first.diagnostics.is_empty());
    assert_eq!(key(&first), key(&second));
    assert_eq!(first.files_checked, second.files_checked);
}
