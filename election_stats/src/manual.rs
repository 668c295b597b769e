/*!

This is the long-form manual for `election_stats` and `election-portal`.

## Input formats

The following sources are supported:
* `csv` Comma Separated Values, with a header row
* `xlsx` Excel workbooks, with the same columns as the CSV results table
* `synthetic` A generated election, reproducible from a seed

### Results table

One row per party and constituency:

| region | constituency_name | party   | votes | total_voters | timestamp            | counting_status | counted_votes |
|--------|-------------------|---------|-------|--------------|----------------------|-----------------|---------------|
| North  | X                 | Party A | 600   | 2000         | 2024-05-15T13:00:00Z | Complete        | 600           |
| North  | X                 | Party B | 400   | 2000         |                      | In Progress     | 310           |

The first five columns are required, the last three are optional. Columns are
matched by name and may come in any order. A blank cell is a missing value.

`counting_status` is one of `Complete`, `In Progress` or `Pending`.
`timestamp` is in RFC 3339 format. A row without a timestamp is stamped with
the time at which the data was loaded.

### Constituency table

| region | constituency_id | constituency_name | total_voters |
|--------|-----------------|-------------------|--------------|
| North  | C001            | X                 | 2000         |

When given (`--constituencies`), this table supplies the electorate of the
results rows that have no `total_voters`.

### Synthetic data

5 regions of 20 constituencies each, contested by the same 5 parties. The
electorate of each constituency is drawn between 50 000 and 200 000 voters,
and each party receives a share of the turnout within its own strength band.
The same seed always produces the same election.

## Cleaning

Before any analysis, the rows go through a cleaning stage:
- exact duplicate rows are removed
- rows without votes, party, constituency, region or electorate are dropped
- rows with negative votes are dropped
- names are trimmed

The cleaning stage logs how many rows it dropped.

## Reports

| report        | content                                                              |
|---------------|----------------------------------------------------------------------|
| `overview`    | total votes, turnout and the leading party                           |
| `describe`    | descriptive statistics of the votes, by party, region or constituency|
| `regional`    | per region and party: votes, shares, seats won and the leader        |
| `turnout`     | turnout of every constituency and its category                       |
| `winners`     | the party with the most votes in each constituency                   |
| `margins`     | the gap between the two best parties of each constituency            |
| `anomalies`   | records that are outliers within their party (z-score)               |
| `swing`       | changes from a previous election (requires `--previous`)             |
| `timeline`    | votes per hour, day or week                                          |
| `top`         | the constituencies with the most votes                               |
| `crosstab`    | votes by region and party                                            |
| `counting`    | state of the count                                                   |
| `prediction`  | predicted winner, with one of the heuristic models                   |

`all` selects every report that the inputs allow.

### Categories

Turnout: `Very High` from 75%, `High` from 60%, `Medium` from 45%, `Low` below.

Margins, on the votes of the two best parties: `Landslide` from 20%,
`Comfortable` from 10%, `Moderate` from 5%, `Close` below. A
constituency with a single distinct party has no margin and no category.

Swing: `Strong Gain` above 5%, `Gain` above 0%, `Loss` above -5%,
`Strong Loss` otherwise.

### Ties

When parties have the same number of votes, the default is to keep the first
one in input order (`firstEncountered`). With `--tie-break partyName`, the
smallest party name wins, regardless of the input order.

### Filters

`--region` keeps the results of the given regions. It can be repeated, or
given as a comma-separated list. `--party` only narrows the `describe`,
`top` and `crosstab` reports; the other reports compare the parties and
always see all of them. Vote shares and turnouts are computed before
filtering, relative to every party of the constituency.

### Undefined values

Values that cannot be computed (a share of an empty total, the standard
deviation of a single value, ...) are `null` in JSON outputs and `NaN` in CSV
outputs. Absent values (no runner-up, no previous result) are `null` in JSON
outputs and an empty cell in CSV outputs.

## Configuration file

All the options can also be given in a JSON file (`--config`). Options on the
command line take precedence.

```json
{
  "outputSettings": {
    "reports": ["overview", "winners"],
    "format": "json",
    "out": "results.json",
    "tieBreak": "partyName"
  },
  "dataSources": {
    "inputType": "csv",
    "results": "results.csv",
    "constituencies": "constituencies.csv",
    "previous": "previous.csv"
  },
  "analysis": {
    "groupBy": "party",
    "zThreshold": 3.0,
    "period": "day",
    "model": "Ensemble",
    "confidence": 0.95,
    "topN": 10,
    "regions": ["North", "South"]
  },
  "users": [
    { "username": "alice", "password": "secret", "role": "analyst" }
  ]
}
```

Relative paths are resolved against the directory of the configuration file.

## Access

Every run is made on behalf of a user (`--user`, `--password`). Without a
`users` section, the only account is `admin` with the password `password123`.

| role      | view | export | predict | edit | delete |
|-----------|------|--------|---------|------|--------|
| `admin`   | x    | x      | x       | x    | x      |
| `analyst` | x    | x      | x       |      |        |
| `viewer`  | x    | x      |         |      |        |
| `guest`   | x    |        |         |      |        |

Writing to a file requires `export`, the `prediction` report requires `predict`.
*/
